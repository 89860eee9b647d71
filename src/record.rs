use crate::{Money, Units};
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(PartialEq)]
pub enum RecordKind {
    Sale,
    Update,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NormalizedRecord {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub app_id: String,
    pub version: String,
    pub kind: RecordKind,
    pub units: Units,
    pub proceeds_per_unit: Money,
    pub currency: String,
    pub country: String,
    pub promo_code: Option<String>,
    pub begin_date: NaiveDate,
}

impl NormalizedRecord {
    pub fn has_promo_code(&self) -> bool {
        self.promo_code
            .as_deref()
            .is_some_and(|code| !code.trim().is_empty())
    }

    pub fn proceeds(&self) -> Money {
        Money::from(self.units) * self.proceeds_per_unit
    }
}

/// A report line plus whether it came from a report file first seen in this run.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord {
    pub is_new: bool,
    pub record: NormalizedRecord,
}

impl TaggedRecord {
    pub fn new(is_new: bool, record: NormalizedRecord) -> Self {
        Self { is_new, record }
    }
}

#[cfg(test)]
impl NormalizedRecord {
    fn line<P: Into<Money>>(
        kind: RecordKind,
        version: &str,
        units: Units,
        proceeds_per_unit: P,
        begin_date: NaiveDate,
    ) -> Self {
        Self {
            sku: "SKU1".to_string(),
            title: "Test App".to_string(),
            app_id: "1000".to_string(),
            version: version.to_string(),
            kind,
            units,
            proceeds_per_unit: proceeds_per_unit.into(),
            currency: "USD".to_string(),
            country: "US".to_string(),
            promo_code: None,
            begin_date,
        }
    }

    pub fn sale<P: Into<Money>>(
        version: &str,
        units: Units,
        proceeds_per_unit: P,
        begin_date: NaiveDate,
    ) -> Self {
        Self::line(RecordKind::Sale, version, units, proceeds_per_unit, begin_date)
    }

    pub fn update(version: &str, units: Units, begin_date: NaiveDate) -> Self {
        Self::line(RecordKind::Update, version, units, 0, begin_date)
    }

    pub fn sku(mut self, sku: &str) -> Self {
        self.sku = sku.to_string();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn app_id(mut self, app_id: &str) -> Self {
        self.app_id = app_id.to_string();
        self
    }

    pub fn country(mut self, country: &str) -> Self {
        self.country = country.to_string();
        self
    }

    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_string();
        self
    }

    pub fn promo(mut self, code: &str) -> Self {
        self.promo_code = Some(code.to_string());
        self
    }

    pub fn old(self) -> TaggedRecord {
        TaggedRecord::new(false, self)
    }

    pub fn fresh(self) -> TaggedRecord {
        TaggedRecord::new(true, self)
    }
}
