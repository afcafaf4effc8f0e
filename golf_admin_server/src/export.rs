use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use golf_admin_entities::domain::tournament::format_date;

use crate::response::{handle_error, APIError};


/// CSV download with a fixed header row.
pub struct CsvExport {
    resource: String,
    writer: csv::Writer<Vec<u8>>,
}

impl CsvExport {
    pub fn new(resource: &str, headers: &[&str]) -> Result<Self, APIError> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(headers).map_err(handle_error)?;
        Ok(CsvExport { resource: resource.to_string(), writer })
    }

    pub fn row<I, S>(&mut self, fields: I) -> Result<(), APIError> where I: IntoIterator<Item = S>, S: AsRef<[u8]> {
        self.writer.write_record(fields).map_err(handle_error)
    }

    pub fn filename(&self) -> String {
        format!("{}_{}.csv", self.resource, chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    }

    pub fn finish(self) -> Result<Response, APIError> {
        let filename = self.filename();
        let data = self.writer.into_inner().map_err(|e| handle_error(e.into_error()))?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
            ],
            data,
        ).into_response())
    }
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "Si" } else { "No" }
}

pub fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(format_date).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_filename_has_resource_and_timestamp() {
        let export = CsvExport::new("zones", &["ID"]).unwrap();
        let filename = export.filename();
        assert!(filename.starts_with("zones_"));
        assert!(filename.ends_with(".csv"));
        assert_eq!(filename.len(), "zones_20240101_120000.csv".len());
    }

    #[test]
    fn test_cells() {
        assert_eq!(yes_no(true), "Si");
        assert_eq!(date_cell(NaiveDate::from_ymd_opt(2024, 3, 5)), "05/03/2024");
        assert_eq!(date_cell(None), "");
    }
}
