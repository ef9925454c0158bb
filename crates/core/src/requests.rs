//! Referral requests ("interconsultas") attached to the form.
//!
//! Each request is a small sub-form with capped text fields. Requests live in an ordered
//! list and have no identity beyond their position.

use crate::constants::{CLINICAL_SUMMARY_MAX, ORIGIN_SECTOR_MAX, REFERRAL_SERVICE_MAX};
use crate::date::mask_date_input;
use crate::{AtestadoError, AtestadoResult};
use atestado_types::CappedText;
use serde::Serialize;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    #[schema(value_type = String, max_length = 41)]
    pub origin_sector: CappedText<ORIGIN_SECTOR_MAX>,
    #[schema(value_type = String, max_length = 37)]
    pub referral_service: CappedText<REFERRAL_SERVICE_MAX>,
    #[schema(value_type = String, max_length = 517)]
    pub clinical_summary: CappedText<CLINICAL_SUMMARY_MAX>,
    pub request_date: String,
}

/// Live "{len} / {max}" counter shown under a capped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CharCounter {
    pub len: usize,
    pub max: usize,
    pub remaining: usize,
}

impl CharCounter {
    pub fn of<const MAX: usize>(text: &CappedText<MAX>) -> Self {
        Self {
            len: text.len(),
            max: CappedText::<MAX>::MAX,
            remaining: text.remaining(),
        }
    }
}

impl std::fmt::Display for CharCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.len, self.max)
    }
}

/// Counters for every capped field of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestCounters {
    pub origin_sector: CharCounter,
    pub referral_service: CharCounter,
    pub clinical_summary: CharCounter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestField {
    OriginSector,
    ReferralService,
    ClinicalSummary,
    RequestDate,
}

impl RequestField {
    pub fn name(self) -> &'static str {
        match self {
            RequestField::OriginSector => "originSector",
            RequestField::ReferralService => "referralService",
            RequestField::ClinicalSummary => "clinicalSummary",
            RequestField::RequestDate => "requestDate",
        }
    }
}

impl FromStr for RequestField {
    type Err = AtestadoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "originSector" => Ok(RequestField::OriginSector),
            "referralService" => Ok(RequestField::ReferralService),
            "clinicalSummary" => Ok(RequestField::ClinicalSummary),
            "requestDate" => Ok(RequestField::RequestDate),
            other => Err(AtestadoError::UnknownField(other.to_string())),
        }
    }
}

impl RequestDetails {
    pub fn counters(&self) -> RequestCounters {
        RequestCounters {
            origin_sector: CharCounter::of(&self.origin_sector),
            referral_service: CharCounter::of(&self.referral_service),
            clinical_summary: CharCounter::of(&self.clinical_summary),
        }
    }

    /// Applies an edit to one field.
    ///
    /// Text beyond a field's cap is cut off. The request date is masked like every other
    /// date.
    ///
    /// # Errors
    ///
    /// Returns `AtestadoError::LineBreakNotAllowed` if a clinical summary edit contains a
    /// line break; the field is left unchanged.
    pub fn set(&mut self, field: RequestField, value: &str) -> AtestadoResult<()> {
        match field {
            RequestField::OriginSector => self.origin_sector = CappedText::truncating(value),
            RequestField::ReferralService => {
                self.referral_service = CappedText::truncating(value)
            }
            RequestField::ClinicalSummary => {
                if value.contains(['\r', '\n']) {
                    return Err(AtestadoError::LineBreakNotAllowed(field.name()));
                }
                self.clinical_summary = CappedText::truncating(value);
            }
            RequestField::RequestDate => self.request_date = mask_date_input(value),
        }
        Ok(())
    }
}

/// Ordered list of referral requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RequestList(Vec<RequestDetails>);

impl RequestList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an empty request and returns its index.
    pub fn add(&mut self) -> usize {
        self.0.push(RequestDetails::default());
        self.0.len() - 1
    }

    /// Appends a copy of the request at `index` and returns the copy's index.
    pub fn duplicate(&mut self, index: usize) -> AtestadoResult<usize> {
        let copy = self.get_checked(index)?.clone();
        self.0.push(copy);
        Ok(self.0.len() - 1)
    }

    /// Removes and returns the request at `index`. Later requests shift down by one.
    pub fn remove(&mut self, index: usize) -> AtestadoResult<RequestDetails> {
        self.get_checked(index)?;
        Ok(self.0.remove(index))
    }

    pub fn update(&mut self, index: usize, field: RequestField, value: &str) -> AtestadoResult<()> {
        let len = self.0.len();
        self.0
            .get_mut(index)
            .ok_or(AtestadoError::RequestIndexOutOfRange { index, len })?
            .set(field, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequestDetails> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    fn get_checked(&self, index: usize) -> AtestadoResult<&RequestDetails> {
        self.0.get(index).ok_or(AtestadoError::RequestIndexOutOfRange {
            index,
            len: self.0.len(),
        })
    }
}

/// Section heading for the request at `index`. The certificate itself counts as the
/// first consultation, so the first request is the second.
pub fn request_heading(index: usize) -> String {
    format!("{}ª Interconsulta - Detalhes", index + 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_appends_empty_request() {
        let mut list = RequestList::new();
        assert_eq!(list.add(), 0);
        assert_eq!(list.add(), 1);
        assert_eq!(list.len(), 2);
        assert_eq!(list.iter().nth(1), Some(&RequestDetails::default()));
    }

    #[test]
    fn test_duplicate_appends_copy_at_end() {
        let mut list = RequestList::new();
        list.add();
        list.add();
        list.update(0, RequestField::OriginSector, "Clínica Médica")
            .unwrap();

        let index = list.duplicate(0).unwrap();
        assert_eq!(index, 2);
        assert_eq!(
            list.iter().nth(2).unwrap().origin_sector.as_str(),
            "Clínica Médica"
        );
        assert_eq!(list.iter().nth(1), Some(&RequestDetails::default()));
    }

    #[test]
    fn test_remove_shifts_later_requests() {
        let mut list = RequestList::new();
        for sector in ["A", "B", "C"] {
            let i = list.add();
            list.update(i, RequestField::OriginSector, sector).unwrap();
        }

        let removed = list.remove(1).unwrap();
        assert_eq!(removed.origin_sector.as_str(), "B");
        let sectors: Vec<&str> = list.iter().map(|r| r.origin_sector.as_str()).collect();
        assert_eq!(sectors, ["A", "C"]);
    }

    #[test]
    fn test_out_of_range_index_is_an_error() {
        let mut list = RequestList::new();
        assert!(matches!(
            list.remove(0),
            Err(AtestadoError::RequestIndexOutOfRange { index: 0, len: 0 })
        ));
        assert!(list.duplicate(3).is_err());
        assert!(list.update(0, RequestField::RequestDate, "01").is_err());
    }

    #[test]
    fn test_fields_are_capped() {
        let mut details = RequestDetails::default();
        details
            .set(RequestField::OriginSector, &"a".repeat(60))
            .unwrap();
        details
            .set(RequestField::ReferralService, &"b".repeat(60))
            .unwrap();
        details
            .set(RequestField::ClinicalSummary, &"c".repeat(600))
            .unwrap();

        assert_eq!(details.origin_sector.len(), 41);
        assert_eq!(details.referral_service.len(), 37);
        assert_eq!(details.clinical_summary.len(), 517);
    }

    #[test]
    fn test_counters_track_length_against_cap() {
        let mut details = RequestDetails::default();
        details
            .set(RequestField::OriginSector, "Pronto-Socorro")
            .unwrap();
        details
            .set(RequestField::ClinicalSummary, &"x".repeat(600))
            .unwrap();

        let counters = details.counters();
        assert_eq!(
            counters.origin_sector,
            CharCounter {
                len: 14,
                max: 41,
                remaining: 27
            }
        );
        assert_eq!(counters.origin_sector.to_string(), "14 / 41");
        assert_eq!(counters.referral_service.to_string(), "0 / 37");
        assert_eq!(counters.clinical_summary.remaining, 0);
        assert_eq!(counters.clinical_summary.to_string(), "517 / 517");
    }

    #[test]
    fn test_request_date_is_masked() {
        let mut details = RequestDetails::default();
        details.set(RequestField::RequestDate, "18102026").unwrap();
        assert_eq!(details.request_date, "18/10/2026");
    }

    #[test]
    fn test_line_breaks_in_summary_are_rejected() {
        let mut details = RequestDetails::default();
        details
            .set(RequestField::ClinicalSummary, "Dor torácica")
            .unwrap();

        let result = details.set(RequestField::ClinicalSummary, "Dor\ntorácica");
        assert!(matches!(
            result,
            Err(AtestadoError::LineBreakNotAllowed("clinicalSummary"))
        ));
        assert_eq!(details.clinical_summary.as_str(), "Dor torácica");
    }

    #[test]
    fn test_field_names_parse() {
        assert_eq!(
            "referralService".parse::<RequestField>().unwrap(),
            RequestField::ReferralService
        );
        assert!("servico".parse::<RequestField>().is_err());
    }

    #[test]
    fn test_heading_counts_from_two() {
        assert_eq!(request_heading(0), "2ª Interconsulta - Detalhes");
        assert_eq!(request_heading(3), "5ª Interconsulta - Detalhes");
    }
}
