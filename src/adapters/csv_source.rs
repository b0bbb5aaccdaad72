use crate::config::CsvSourceConfig;
use crate::domain::model::SourceRow;
use crate::domain::ports::RequestSource;
use crate::utils::error::{ProvisionError, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// 從本機 CSV 讀取課程申請，第一列必須是標題列
pub struct CsvRequestSource {
    path: PathBuf,
    course_name_column: String,
    email_column: String,
}

impl CsvRequestSource {
    pub fn new(config: &CsvSourceConfig) -> Self {
        Self {
            path: config.path.clone(),
            course_name_column: config.course_name_column.clone(),
            email_column: config.email_column.clone(),
        }
    }

    fn parse<R: std::io::Read>(&self, reader: R) -> Result<Vec<SourceRow>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let email_idx = headers
            .iter()
            .position(|h| h == self.email_column)
            .ok_or_else(|| ProvisionError::ConfigError {
                message: format!(
                    "CSV {} has no '{}' column",
                    self.path.display(),
                    self.email_column
                ),
            })?;
        let name_idx = headers.iter().position(|h| h == self.course_name_column);
        if name_idx.is_none() {
            tracing::warn!(
                "⚠️ CSV has no '{}' column, every course will be Untitled",
                self.course_name_column
            );
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let cell = |idx: usize| {
                record
                    .get(idx)
                    .filter(|value| !value.is_empty())
                    .map(String::from)
            };
            rows.push(SourceRow {
                course_name: name_idx.and_then(cell),
                email: cell(email_idx),
            });
        }

        Ok(rows)
    }
}

#[async_trait]
impl RequestSource for CsvRequestSource {
    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }

    async fn read_rows(&self) -> Result<Vec<SourceRow>> {
        let data = tokio::fs::read(&self.path).await?;
        let rows = self.parse(data.as_slice())?;
        tracing::debug!("Read {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source_for(file: &NamedTempFile) -> CsvRequestSource {
        CsvRequestSource::new(&CsvSourceConfig {
            path: file.path().to_path_buf(),
            course_name_column: "Course Name".to_string(),
            email_column: "Email Address".to_string(),
        })
    }

    #[tokio::test]
    async fn test_reads_rows_by_header_name() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "Timestamp,Email Address,Department,Course Name\n\
             2018-08-01,alice@nths.net,Science,Biology Period 4\n\
             2018-08-02,bob@newtrier.k12.il.us,Math,\n"
        )
        .unwrap();

        let rows = source_for(&file).read_rows().await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].course_name.as_deref(), Some("Biology Period 4"));
        assert_eq!(rows[0].email.as_deref(), Some("alice@nths.net"));
        assert_eq!(rows[1].course_name, None);
        assert_eq!(rows[1].email.as_deref(), Some("bob@newtrier.k12.il.us"));
    }

    #[tokio::test]
    async fn test_short_rows_are_tolerated() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Email Address,Course Name\ncarol@nths.net\n").unwrap();

        let rows = source_for(&file).read_rows().await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].course_name, None);
        assert_eq!(rows[0].email.as_deref(), Some("carol@nths.net"));
    }

    #[tokio::test]
    async fn test_missing_email_column_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Course Name,Teacher\nArt,dave\n").unwrap();

        let err = source_for(&file).read_rows().await.unwrap_err();
        assert!(matches!(err, ProvisionError::ConfigError { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = CsvRequestSource::new(&CsvSourceConfig {
            path: PathBuf::from("/nonexistent/requests.csv"),
            course_name_column: "Course Name".to_string(),
            email_column: "Email Address".to_string(),
        });

        let err = source.read_rows().await.unwrap_err();
        assert!(matches!(err, ProvisionError::IoError(_)));
    }
}
