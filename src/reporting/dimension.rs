//! Report dimensions and time windows

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use super::ReportError;

/// Calendar bucket for date-grouped reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Day,
    Month,
}

/// What transactions are grouped by in an aggregate report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDimension {
    /// Officer's own username
    Officer,
    /// Username of the officer's coordinator
    Coordinator,
    RbmCode,
    /// Name of the officer's area
    Area,
    Date(DateBucket),
}

impl ReportDimension {
    pub const ALL: [ReportDimension; 6] = [
        ReportDimension::RbmCode,
        ReportDimension::Coordinator,
        ReportDimension::Officer,
        ReportDimension::Area,
        ReportDimension::Date(DateBucket::Day),
        ReportDimension::Date(DateBucket::Month),
    ];

    /// Path segment identifying this report
    pub fn slug(self) -> &'static str {
        match self {
            ReportDimension::Officer => "officer",
            ReportDimension::Coordinator => "coordinator",
            ReportDimension::RbmCode => "rbm",
            ReportDimension::Area => "area",
            ReportDimension::Date(DateBucket::Day) => "daily",
            ReportDimension::Date(DateBucket::Month) => "monthly",
        }
    }

    pub fn from_slug(slug: &str) -> Result<Self, ReportError> {
        Self::ALL
            .into_iter()
            .find(|dimension| dimension.slug() == slug)
            .ok_or_else(|| ReportError::UnknownDimension(slug.to_string()))
    }

    /// Filename prefix of exported artifacts
    pub fn report_name(self) -> String {
        format!("{}_report", self.slug())
    }

    /// Export columns: the group label, then count and sum
    pub fn headers(self) -> &'static [&'static str] {
        match self {
            ReportDimension::Officer | ReportDimension::Coordinator => &["username", "count", "total"],
            ReportDimension::RbmCode => &["rbm_code", "count", "total"],
            ReportDimension::Area => &["name", "count", "total"],
            ReportDimension::Date(DateBucket::Day) => &["date", "count", "total"],
            ReportDimension::Date(DateBucket::Month) => &["month", "count", "total"],
        }
    }

    /// Label expression, join chain and group key, in that order.
    ///
    /// Every chain starts from `transactions t`; inner joins drop officers
    /// with no transactions from the result.
    pub(crate) fn sql_parts(self) -> (&'static str, &'static str, &'static str) {
        match self {
            ReportDimension::Officer => (
                "u.username",
                "JOIN officers o ON o.id = t.officer_id \
                 JOIN users u ON u.id = o.user_id",
                "u.id, u.username",
            ),
            ReportDimension::Coordinator => (
                "u.username",
                "JOIN officers o ON o.id = t.officer_id \
                 JOIN users u ON u.id = o.coordinator_id",
                "u.id, u.username",
            ),
            ReportDimension::RbmCode => (
                "o.rbm_code",
                "JOIN officers o ON o.id = t.officer_id",
                "o.rbm_code",
            ),
            ReportDimension::Area => (
                "a.name",
                "JOIN officers o ON o.id = t.officer_id \
                 JOIN users u ON u.id = o.user_id \
                 JOIN areas a ON a.code = u.area_code",
                "a.code, a.name",
            ),
            ReportDimension::Date(DateBucket::Day) => (
                "to_char(t.periode, 'YYYY-MM-DD')",
                "",
                "to_char(t.periode, 'YYYY-MM-DD')",
            ),
            ReportDimension::Date(DateBucket::Month) => (
                "to_char(t.periode, 'YYYY-MM')",
                "",
                "to_char(t.periode, 'YYYY-MM')",
            ),
        }
    }
}

/// Inclusive bounds on the billing period; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TimeWindow {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl TimeWindow {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, ReportError> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(ReportError::InvalidWindow { from, to });
            }
        }
        Ok(Self { from, to })
    }

    /// Open window covering everything
    pub fn all() -> Self {
        Self::default()
    }

    /// `days` back from `today`, open-ended forward
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        Self {
            from: Some(today - Duration::days(days)),
            to: None,
        }
    }

    pub fn validate(self) -> Result<Self, ReportError> {
        Self::new(self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_slug_round_trip_for_every_dimension() {
        for dimension in ReportDimension::ALL {
            assert_eq!(ReportDimension::from_slug(dimension.slug()).unwrap(), dimension);
        }
    }

    #[test]
    fn test_unknown_slug() {
        assert!(matches!(
            ReportDimension::from_slug("tunggakan"),
            Err(ReportError::UnknownDimension(s)) if s == "tunggakan"
        ));
    }

    #[test]
    fn test_report_names_and_headers() {
        assert_eq!(ReportDimension::RbmCode.report_name(), "rbm_report");
        assert_eq!(ReportDimension::RbmCode.headers(), &["rbm_code", "count", "total"]);
        assert_eq!(ReportDimension::Coordinator.headers()[0], "username");
        assert_eq!(ReportDimension::Date(DateBucket::Month).headers()[0], "month");
    }

    #[test]
    fn test_coordinator_joins_through_coordinator_id() {
        let (_, joins, _) = ReportDimension::Coordinator.sql_parts();
        assert!(joins.contains("o.coordinator_id"));
        let (_, joins, _) = ReportDimension::Officer.sql_parts();
        assert!(joins.contains("o.user_id"));
    }

    #[test]
    fn test_window_rejects_inverted_bounds() {
        assert!(TimeWindow::new(Some(date(2024, 3, 1)), Some(date(2024, 2, 1))).is_err());
        assert!(TimeWindow::new(Some(date(2024, 2, 1)), Some(date(2024, 2, 1))).is_ok());
    }

    #[test]
    fn test_trailing_window() {
        let window = TimeWindow::trailing(date(2024, 7, 1), 180);
        assert_eq!(window.from, Some(date(2024, 1, 3)));
        assert!(window.to.is_none());
    }
}
