//! GraphQL query descriptor for the AstorbDB ephemeris table.

use chrono::NaiveDate;
use serde_json::json;

use crate::model::sky::SkyWindow;

/// One page request: window bounds for a single RA segment, magnitude
/// ceiling, date and optional pagination cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
    pub mag_limit: f64,
    pub date: NaiveDate,
    pub page_size: usize,
    /// Exclusive lower bound on `id_minorplanet`
    pub after: Option<u64>,
}

impl CatalogQuery {
    pub fn new(
        segment: (f64, f64),
        window: &SkyWindow,
        date: NaiveDate,
        mag_limit: f64,
        page_size: usize,
    ) -> Self {
        Self {
            ra_min: segment.0,
            ra_max: segment.1,
            dec_min: window.dec_min,
            dec_max: window.dec_max,
            mag_limit,
            date,
            page_size,
            after: None,
        }
    }

    /// Same filters, continuing after `cursor`.
    pub fn after(&self, cursor: u64) -> Self {
        Self {
            after: Some(cursor),
            ..self.clone()
        }
    }

    pub fn to_graphql(&self) -> String {
        let cursor = match self.after {
            Some(id) => format!(",\n        id_minorplanet: {{_gt: \"{}\"}}", id),
            None => String::new(),
        };

        format!(
            r#"query ObservableAsteroids {{
  ephemeris(
    where: {{
        eph_date: {{_eq: "{date}"}},
        ra:       {{_gte: "{ra_min}", _lte: "{ra_max}"}},
        dec:      {{_gte: "{dec_min}", _lte: "{dec_max}"}},
        v_mag:    {{_lte: "{mag}"}}{cursor}
    }}
    order_by: {{id_minorplanet: asc}}
    limit: {limit}
  ) {{
    id_minorplanet
    minorplanet {{
      ast_number
      designation: designameByIdDesignationPrimary {{
        str_designame
      }}
    }}
    ra
    ra_rate
    dec
    dec_rate
    v_mag
  }}
}}"#,
            date = self.date.format("%Y-%m-%d"),
            ra_min = self.ra_min,
            ra_max = self.ra_max,
            dec_min = self.dec_min,
            dec_max = self.dec_max,
            mag = self.mag_limit,
            cursor = cursor,
            limit = self.page_size,
        )
    }

    /// Request body for the GraphQL endpoint.
    pub fn to_body(&self) -> serde_json::Value {
        json!({ "query": self.to_graphql() })
    }
}
