use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rust_decimal::Decimal;

use super::ExportError;
use crate::models::{ActivityRecord, HeartRateZone};

const TCX_NAMESPACE: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const TCX_SCHEMA_LOCATION: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2 \
     http://www.garmin.com/xmlschemas/TrainingCenterDatabasev2.xsd";
const ACTIVITY_EXTENSION_NAMESPACE: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v2";

const SPORT: &str = "Other";
const CREATOR_NAME: &str = "FitBridge";
const CREATOR_PRODUCT_ID: &str = "65534";

impl From<quick_xml::Error> for ExportError {
    fn from(err: quick_xml::Error) -> Self {
        ExportError::SerializationError(err.to_string())
    }
}

pub struct TcxExporter;

impl TcxExporter {
    /// `activity_<logId>_<YYYYmmdd_HHMMSS>.tcx`
    pub fn file_name(activity: &ActivityRecord) -> String {
        format!(
            "activity_{}_{}.tcx",
            activity.log_id,
            activity.start_time.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write one activity into `dir`; `None` when it has no zones to export
    pub fn export_activity(
        activity: &ActivityRecord,
        dir: &Path,
    ) -> Result<Option<PathBuf>, ExportError> {
        if activity.export_zones().is_empty() {
            tracing::debug!(log_id = activity.log_id, "No zones to export, skipping TCX");
            return Ok(None);
        }

        let xml = Self::generate_tcx_xml(activity)?;
        let path = dir.join(Self::file_name(activity));
        fs::write(&path, xml)?;
        tracing::debug!("Generated TCX file: {}", path.display());
        Ok(Some(path))
    }

    pub fn generate_tcx_xml(activity: &ActivityRecord) -> Result<String, ExportError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut root = BytesStart::new("TrainingCenterDatabase");
        root.push_attribute(("xmlns", TCX_NAMESPACE));
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        root.push_attribute(("xsi:schemaLocation", TCX_SCHEMA_LOCATION));
        writer.write_event(Event::Start(root))?;
        writer.write_event(Event::Start(BytesStart::new("Activities")))?;

        let mut activity_elem = BytesStart::new("Activity");
        activity_elem.push_attribute(("Sport", SPORT));
        writer.write_event(Event::Start(activity_elem))?;

        let start = activity.start_time.format("%Y-%m-%dT%H:%M:%S.000Z").to_string();
        Self::write_text_element(&mut writer, "Id", &start)?;
        Self::write_lap(&mut writer, activity, &start)?;
        Self::write_text_element(
            &mut writer,
            "Notes",
            &format!("{} | Log ID: {}", activity.activity_name, activity.log_id),
        )?;
        Self::write_creator(&mut writer, activity)?;

        writer.write_event(Event::End(BytesEnd::new("Activity")))?;
        writer.write_event(Event::End(BytesEnd::new("Activities")))?;
        writer.write_event(Event::End(BytesEnd::new("TrainingCenterDatabase")))?;

        let bytes = writer.into_inner();
        String::from_utf8(bytes).map_err(|err| ExportError::SerializationError(err.to_string()))
    }

    fn write_lap<W: Write>(
        writer: &mut Writer<W>,
        activity: &ActivityRecord,
        start: &str,
    ) -> Result<(), ExportError> {
        let mut lap = BytesStart::new("Lap");
        lap.push_attribute(("StartTime", start));
        writer.write_event(Event::Start(lap))?;

        let seconds = (Decimal::from(activity.duration_ms) / Decimal::from(1000)).normalize();
        Self::write_text_element(writer, "TotalTimeSeconds", &seconds.to_string())?;

        let meters = (activity.distance.unwrap_or_default() * Decimal::from(1000)).normalize();
        Self::write_text_element(writer, "DistanceMeters", &meters.to_string())?;

        if let Some(calories) = activity.calories {
            Self::write_text_element(writer, "Calories", &calories.to_string())?;
        }
        if let Some(average) = activity.average_heart_rate {
            Self::write_bpm_element(writer, "AverageHeartRateBpm", average)?;
        }
        if let Some(max) = activity.max_heart_rate {
            Self::write_bpm_element(writer, "MaximumHeartRateBpm", max)?;
        }

        Self::write_text_element(writer, "Intensity", "Active")?;
        Self::write_text_element(writer, "TriggerMethod", "Manual")?;
        Self::write_zone_extensions(writer, activity.export_zones())?;

        writer.write_event(Event::End(BytesEnd::new("Lap")))?;
        Ok(())
    }

    /// `LX` block with one element per zone that has recorded time
    fn write_zone_extensions<W: Write>(
        writer: &mut Writer<W>,
        zones: &[HeartRateZone],
    ) -> Result<(), ExportError> {
        writer.write_event(Event::Start(BytesStart::new("Extensions")))?;

        let mut lx = BytesStart::new("LX");
        lx.push_attribute(("xmlns", ACTIVITY_EXTENSION_NAMESPACE));
        writer.write_event(Event::Start(lx))?;

        for zone in zones.iter().filter(|z| z.minutes > 0) {
            let index = zone.zone_index.unwrap_or(0).to_string();
            let low = zone.min_bpm.to_string();
            let high = zone.max_bpm.to_string();
            let minutes = zone.minutes.to_string();

            let mut elem = BytesStart::new("HeartRateZone");
            elem.push_attribute(("Index", index.as_str()));
            elem.push_attribute(("Name", zone.display_name()));
            elem.push_attribute(("Low", low.as_str()));
            elem.push_attribute(("High", high.as_str()));
            elem.push_attribute(("Minutes", minutes.as_str()));
            writer.write_event(Event::Empty(elem))?;
        }

        writer.write_event(Event::End(BytesEnd::new("LX")))?;
        writer.write_event(Event::End(BytesEnd::new("Extensions")))?;
        Ok(())
    }

    fn write_creator<W: Write>(
        writer: &mut Writer<W>,
        activity: &ActivityRecord,
    ) -> Result<(), ExportError> {
        let mut creator = BytesStart::new("Creator");
        creator.push_attribute(("xsi:type", "Device_t"));
        writer.write_event(Event::Start(creator))?;

        Self::write_text_element(writer, "Name", CREATOR_NAME)?;
        Self::write_text_element(writer, "UnitId", &activity.log_id.to_string())?;
        Self::write_text_element(writer, "ProductID", CREATOR_PRODUCT_ID)?;

        writer.write_event(Event::Start(BytesStart::new("Version")))?;
        Self::write_text_element(writer, "VersionMajor", "1")?;
        Self::write_text_element(writer, "VersionMinor", "0")?;
        writer.write_event(Event::End(BytesEnd::new("Version")))?;

        writer.write_event(Event::End(BytesEnd::new("Creator")))?;
        Ok(())
    }

    fn write_bpm_element<W: Write>(
        writer: &mut Writer<W>,
        name: &str,
        bpm: u16,
    ) -> Result<(), ExportError> {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        Self::write_text_element(writer, "Value", &bpm.to_string())?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn write_text_element<W: Write>(
        writer: &mut Writer<W>,
        name: &str,
        value: &str,
    ) -> Result<(), ExportError> {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}
