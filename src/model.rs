use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body returned by the prediction endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub predictions: Vec<RawPrediction>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub total_transactions: Option<u64>,
    #[serde(default)]
    pub fraudulent_transactions: Option<u64>,
    /// The service reports its own failures as `{"error": "..."}` with a 200.
    #[serde(default)]
    pub error: Option<String>,
}

/// One element of `predictions`: either a bare label (what the model
/// service emits, e.g. `0`/`1`) or a record carrying a label field.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "Value")]
pub enum RawPrediction {
    Record(RawRecord),
    Bare(Value),
}

#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub id: Option<Value>,
    pub amount: Option<Value>,
    pub label: Option<Value>,
}

/// Checked in order; the first non-null one wins.
pub const LABEL_KEYS: [&str; 5] = ["label", "prediction", "class", "Class", "is_fraud"];

fn take_first(m: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .find_map(|k| m.get(*k).filter(|v| !v.is_null()).map(|_| *k))
        .and_then(|k| m.remove(k))
}

impl From<Value> for RawPrediction {
    fn from(v: Value) -> Self {
        match v {
            Value::Object(mut m) => RawPrediction::Record(RawRecord {
                id: take_first(&mut m, &["id"]),
                amount: take_first(&mut m, &["amount", "Amount"]),
                label: take_first(&mut m, &LABEL_KEYS),
            }),
            other => RawPrediction::Bare(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Fraud,
    Safe,
}

impl Label {
    /// `1`, `true`, `"1"`, `"true"` and `"fraud"` (any case) mean fraud.
    pub fn from_value(v: &Value) -> Self {
        let fraud = match v {
            Value::Number(n) => n.as_f64() == Some(1.0),
            Value::Bool(b) => *b,
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "fraud"),
            _ => false,
        };
        if fraud {
            Label::Fraud
        } else {
            Label::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Fraud => "Fraud",
            Label::Safe => "Safe",
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            Label::Fraud => "⚠️ Fraud",
            Label::Safe => "✅ Safe",
        }
    }
}

/// Display row for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub id: String,
    pub amount: f64,
    pub prediction: Label,
    pub flag: &'static str,
}

impl PredictionRecord {
    pub fn new(id: String, amount: f64, prediction: Label) -> Self {
        Self {
            id,
            amount,
            prediction,
            flag: prediction.flag(),
        }
    }

    pub fn is_fraud(&self) -> bool {
        self.prediction == Label::Fraud
    }
}

fn record_id(id: Option<&Value>, index: usize) -> String {
    let fallback = || (index + 1).to_string();
    match id {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        _ => fallback(),
    }
}

fn amount(v: Option<&Value>) -> f64 {
    let parsed = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|a| a.is_finite()).unwrap_or(0.0)
}

pub fn map_prediction(raw: &RawPrediction, index: usize) -> PredictionRecord {
    match raw {
        RawPrediction::Bare(v) => PredictionRecord::new(record_id(None, index), 0.0, Label::from_value(v)),
        RawPrediction::Record(r) => {
            let label = r.label.as_ref().map(Label::from_value).unwrap_or(Label::Safe);
            PredictionRecord::new(record_id(r.id.as_ref(), index), amount(r.amount.as_ref()), label)
        }
    }
}

pub fn map_predictions(raw: &[RawPrediction]) -> Vec<PredictionRecord> {
    raw.iter().enumerate().map(|(i, p)| map_prediction(p, i)).collect()
}

/// KPI values. Server-supplied figures win; missing ones are counted locally.
/// The two sources are not reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    pub accuracy: Option<f64>,
    pub total: u64,
    pub fraud: u64,
}

impl Summary {
    pub fn from_response(resp: &PredictionResponse, records: &[PredictionRecord]) -> Self {
        let local_fraud = records.iter().filter(|r| r.is_fraud()).count() as u64;
        Self {
            accuracy: resp.accuracy.filter(|a| a.is_finite()),
            total: resp.total_transactions.unwrap_or(records.len() as u64),
            fraud: resp.fraudulent_transactions.unwrap_or(local_fraud),
        }
    }

    pub fn safe(&self) -> u64 {
        self.total.saturating_sub(self.fraud)
    }

    /// Fractions are scaled to percent; values above 1 are taken as percent
    /// already.
    pub fn accuracy_display(&self) -> String {
        match self.accuracy {
            Some(a) if a > 1.0 => format!("{:.2}%", a),
            Some(a) => format!("{:.2}%", a * 100.0),
            None => "--".to_string(),
        }
    }
}

/// Mapped result of one upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionSet {
    pub records: Vec<PredictionRecord>,
    pub summary: Summary,
}

impl PredictionSet {
    pub fn from_response(resp: &PredictionResponse) -> Self {
        let records = map_predictions(&resp.predictions);
        let summary = Summary::from_response(resp, &records);
        Self { records, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: Value) -> PredictionResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_server_summary_taken_verbatim() {
        let resp = parse(json!({
            "predictions": [{"id": 1, "amount": "50"}, {"id": 2, "amount": 12.5}],
            "accuracy": 0.9,
            "total_transactions": 2,
            "fraudulent_transactions": 1
        }));
        let set = PredictionSet::from_response(&resp);
        assert_eq!(set.summary.accuracy_display(), "90.00%");
        assert_eq!(set.summary.total, 2);
        assert_eq!(set.summary.fraud, 1);
        assert_eq!(set.summary.safe(), 1);
        assert_eq!(set.records[0].amount, 50.0);
        assert_eq!(set.records[1].amount, 12.5);
    }

    #[test]
    fn test_missing_summary_counted_locally() {
        let resp = parse(json!({ "predictions": [1, 0, 0, 1, 1] }));
        let set = PredictionSet::from_response(&resp);
        assert_eq!(set.summary.accuracy, None);
        assert_eq!(set.summary.accuracy_display(), "--");
        assert_eq!(set.summary.total, 5);
        assert_eq!(set.summary.fraud, 3);
        assert_eq!(set.summary.safe(), 2);
    }

    #[test]
    fn test_bare_labels_get_positional_ids() {
        let recs = map_predictions(&parse(json!({ "predictions": [0, 1] })).predictions);
        assert_eq!(recs[0].id, "1");
        assert_eq!(recs[0].prediction, Label::Safe);
        assert_eq!(recs[0].flag, "✅ Safe");
        assert_eq!(recs[1].id, "2");
        assert_eq!(recs[1].prediction, Label::Fraud);
        assert_eq!(recs[1].flag, "⚠️ Fraud");
        assert_eq!(recs[1].amount, 0.0);
    }

    #[test]
    fn test_record_label_fields() {
        let recs = map_predictions(
            &parse(json!({ "predictions": [
                {"id": "tx-9", "label": 1},
                {"prediction": "Fraud"},
                {"Class": 0},
                {"is_fraud": true},
                {"id": 0, "amount": "n/a"}
            ] }))
            .predictions,
        );
        let labels: Vec<Label> = recs.iter().map(|r| r.prediction).collect();
        assert_eq!(
            labels,
            vec![Label::Fraud, Label::Fraud, Label::Safe, Label::Fraud, Label::Safe]
        );
        assert_eq!(recs[0].id, "tx-9");
        assert_eq!(recs[4].id, "5");
        assert_eq!(recs[4].amount, 0.0);
    }

    #[test]
    fn test_overlapping_label_fields_keep_id_and_amount() {
        let recs = map_predictions(
            &parse(json!({ "predictions": [
                {"id": 7, "amount": 120.5, "prediction": 1, "Class": 1},
                {"id": 8, "amount": 30, "is_fraud": 1},
                {"id": 9, "Amount": "4.5", "is_fraud": "true"},
                {"id": 10, "label": null, "Class": 1}
            ] }))
            .predictions,
        );
        let got: Vec<(&str, f64, Label)> = recs.iter().map(|r| (r.id.as_str(), r.amount, r.prediction)).collect();
        assert_eq!(
            got,
            vec![
                ("7", 120.5, Label::Fraud),
                ("8", 30.0, Label::Fraud),
                ("9", 4.5, Label::Fraud),
                ("10", 0.0, Label::Fraud),
            ]
        );
        let set = PredictionSet::from_response(&parse(json!({ "predictions": [
            {"id": 7, "prediction": 1, "Class": 1},
            {"id": 8, "is_fraud": 1},
            {"id": 11, "prediction": 0, "Class": 0}
        ] })));
        assert_eq!(set.summary.fraud, 2);
        assert_eq!(set.summary.safe(), 1);
    }

    #[test]
    fn test_record_without_label_is_safe() {
        // The whole record is never compared against the fraud sentinel.
        let recs = map_predictions(&parse(json!({ "predictions": [{"id": 1, "amount": 1}] })).predictions);
        assert_eq!(recs[0].prediction, Label::Safe);
    }

    #[test]
    fn test_label_from_strings() {
        assert_eq!(Label::from_value(&json!("FRAUD")), Label::Fraud);
        assert_eq!(Label::from_value(&json!(" 1 ")), Label::Fraud);
        assert_eq!(Label::from_value(&json!("safe")), Label::Safe);
        assert_eq!(Label::from_value(&json!(1.0)), Label::Fraud);
        assert_eq!(Label::from_value(&json!(2)), Label::Safe);
        assert_eq!(Label::from_value(&Value::Null), Label::Safe);
    }

    #[test]
    fn test_percent_accuracy_not_rescaled() {
        let s = Summary { accuracy: Some(99.83), total: 10, fraud: 0 };
        assert_eq!(s.accuracy_display(), "99.83%");
    }

    #[test]
    fn test_safe_never_negative() {
        let s = Summary { accuracy: None, total: 1, fraud: 4 };
        assert_eq!(s.safe(), 0);
    }

    #[test]
    fn test_error_body_parses() {
        let resp = parse(json!({ "error": "could not parse csv" }));
        assert!(resp.predictions.is_empty());
        assert_eq!(resp.error.as_deref(), Some("could not parse csv"));
    }
}
