//! Upload/predict flow: one selected file, one request, one result set.

use std::fmt::Write as _;
use std::path::Path;

use crate::data::SelectedFile;
use crate::error::UPLOAD_FAILED;
use crate::logging::{log_file_selected, log_predictions, log_upload_skipped};
use crate::model::{PredictionRecord, PredictionSet, Summary};
use crate::notify::Notice;
use crate::service::PredictionService;

pub const NO_FILE: &str = "Please select a file first.";
pub const EMPTY_TABLE: &str = "No predictions yet. Upload a file to see results.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiCard {
    pub title: &'static str,
    pub value: String,
}

/// Clears the busy flag even when the upload future is dropped mid-request.
struct BusyGuard<'a>(&'a mut bool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[derive(Debug, Default)]
pub struct Dashboard {
    file: Option<SelectedFile>,
    busy: bool,
    result: PredictionSet,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous selection.
    pub fn select_file(&mut self, file: SelectedFile) {
        log_file_selected(&file.name, file.len(), file.upload_id());
        self.file = Some(file);
    }

    pub async fn select_path(&mut self, path: &Path) -> std::io::Result<()> {
        let file = SelectedFile::read(path).await?;
        self.select_file(file);
        Ok(())
    }

    pub fn clear_file(&mut self) {
        self.file = None;
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.result.records
    }

    pub fn summary(&self) -> &Summary {
        &self.result.summary
    }

    pub fn result(&self) -> &PredictionSet {
        &self.result
    }

    /// Sends the selected file for classification. A failed request keeps
    /// the previous results on screen.
    pub async fn upload<S>(&mut self, service: &S) -> Notice
    where
        S: PredictionService + Sync + ?Sized,
    {
        let Some(file) = self.file.as_ref() else {
            log_upload_skipped("no_file");
            return Notice::warning(NO_FILE);
        };
        if self.busy {
            log_upload_skipped("busy");
            return Notice::warning("An upload is already in progress.");
        }

        let outcome = {
            self.busy = true;
            let _busy = BusyGuard(&mut self.busy);
            service.predict(file).await
        };

        match outcome {
            Ok(resp) => {
                let set = PredictionSet::from_response(&resp);
                let s = set.summary;
                log_predictions(file.upload_id(), s.total, s.fraud, s.safe(), s.accuracy);
                self.result = set;
                Notice::success(format!(
                    "Predictions ready: {} transactions, {} flagged as fraud.",
                    s.total, s.fraud
                ))
            }
            // Detail was logged by the service.
            Err(_) => Notice::error(UPLOAD_FAILED),
        }
    }

    pub fn kpi_cards(&self) -> [KpiCard; 4] {
        let s = &self.result.summary;
        [
            KpiCard { title: "Accuracy", value: s.accuracy_display() },
            KpiCard { title: "Total Transactions", value: s.total.to_string() },
            KpiCard { title: "Fraudulent Transactions", value: s.fraud.to_string() },
            KpiCard { title: "Safe Transactions", value: s.safe().to_string() },
        ]
    }

    pub fn render_kpis(&self) -> String {
        let mut out = String::new();
        for card in self.kpi_cards() {
            let _ = writeln!(out, "{:<24} {}", card.title, card.value);
        }
        out
    }

    pub fn render_table(&self) -> String {
        render_records(&self.result.records)
    }
}

pub fn render_records(records: &[PredictionRecord]) -> String {
    if records.is_empty() {
        return format!("{}\n", EMPTY_TABLE);
    }
    let id_w = records.iter().map(|r| r.id.chars().count()).max().unwrap_or(0).max(2);
    let mut out = String::new();
    let _ = writeln!(out, "{:<id_w$}  {:<10}  {}", "ID", "Prediction", "Flag");
    for r in records {
        let _ = writeln!(out, "{:<id_w$}  {:<10}  {}", r.id, r.prediction.as_str(), r.flag);
    }
    out
}
