// src/models/import.rs

use serde::Serialize;
use utoipa::ToSchema;

/// Resultado de uma importação em massa. `processed = imported + failed`.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub processed: usize,
    pub imported: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn record_success(&mut self) {
        self.processed += 1;
        self.imported += 1;
    }

    pub fn record_failure(&mut self, row: usize, message: String) {
        self.processed += 1;
        self.failed += 1;
        self.errors.push(RowError { row, message });
    }
}

/// `row` é a linha do arquivo (o cabeçalho é a linha 1)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

// Upload multipart (só para a documentação)
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct CsvUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_is_imported_plus_failed() {
        let mut report = ImportReport::default();
        report.record_success();
        report.record_failure(3, "name: obrigatório".into());
        report.record_success();
        report.record_failure(7, "stage: inválido".into());

        assert_eq!(report.processed, 4);
        assert_eq!(report.imported, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.processed, report.imported + report.failed);
        assert_eq!(
            report.errors,
            vec![
                RowError { row: 3, message: "name: obrigatório".into() },
                RowError { row: 7, message: "stage: inválido".into() },
            ]
        );
    }
}
