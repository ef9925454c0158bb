//! Certificate form state.
//!
//! [`FormState`] holds the structured fields, the derived certificate text and the
//! start-date validation flag. The derived text is recomputed on every field change but
//! can also be edited directly; a direct edit lasts until the next field change.

use crate::constants::{
    FORM_CLEARED_NOTICE, INVALID_DATE_MESSAGE, LINE_BREAK_NOTICE, PRINT_DISABLED_TOOLTIP,
    PRINT_TOOLTIP,
};
use crate::date::{mask_date_input, DateStatus};
use crate::notice::Notice;
use crate::requests::{RequestField, RequestList};
use crate::template::render_certificate_text;
use crate::{AtestadoError, AtestadoResult};
use serde::Serialize;
use std::str::FromStr;
use utoipa::ToSchema;

/// Structured certificate fields. All values are kept as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    pub patient_name: String,
    /// RG and/or CPF.
    pub patient_id: String,
    pub cid: String,
    pub days_off_numeric: String,
    /// Leave start date, `DD/MM/YYYY`.
    pub start_date: String,
    /// Issue date, `DD/MM/YYYY`.
    pub attestation_date: String,
}

impl FormData {
    /// Empty form dated `today`.
    pub fn blank(today: impl Into<String>) -> Self {
        Self {
            attestation_date: today.into(),
            ..Self::default()
        }
    }

    fn slot(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::PatientName => &mut self.patient_name,
            FormField::PatientId => &mut self.patient_id,
            FormField::Cid => &mut self.cid,
            FormField::DaysOffNumeric => &mut self.days_off_numeric,
            FormField::StartDate => &mut self.start_date,
            FormField::AttestationDate => &mut self.attestation_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    PatientName,
    PatientId,
    Cid,
    DaysOffNumeric,
    StartDate,
    AttestationDate,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::PatientName,
        FormField::PatientId,
        FormField::Cid,
        FormField::DaysOffNumeric,
        FormField::StartDate,
        FormField::AttestationDate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormField::PatientName => "patientName",
            FormField::PatientId => "patientId",
            FormField::Cid => "cid",
            FormField::DaysOffNumeric => "daysOffNumeric",
            FormField::StartDate => "startDate",
            FormField::AttestationDate => "attestationDate",
        }
    }

    pub fn is_date(self) -> bool {
        matches!(self, FormField::StartDate | FormField::AttestationDate)
    }
}

impl FromStr for FormField {
    type Err = AtestadoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| AtestadoError::UnknownField(s.to_string()))
    }
}

/// In-memory state of one certificate form.
#[derive(Debug, Clone)]
pub struct FormState {
    data: FormData,
    generated_text: String,
    start_date_status: DateStatus,
    requests: RequestList,
    notice: Option<Notice>,
}

impl FormState {
    /// Fresh form dated `today`.
    pub fn new(today: impl Into<String>) -> Self {
        Self::from_data(FormData::blank(today))
    }

    /// Form pre-filled with `data`. Date fields are taken as given.
    pub fn from_data(data: FormData) -> Self {
        let generated_text = render_certificate_text(&data);
        let start_date_status = DateStatus::of(&data.start_date);
        Self {
            data,
            generated_text,
            start_date_status,
            requests: RequestList::new(),
            notice: None,
        }
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn generated_text(&self) -> &str {
        &self.generated_text
    }

    pub fn requests(&self) -> &RequestList {
        &self.requests
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// `true` while a start date is present but not a real date.
    pub fn is_date_invalid(&self) -> bool {
        self.start_date_status.is_invalid()
    }

    /// Inline message for the start date field, if any.
    pub fn start_date_error(&self) -> Option<&'static str> {
        self.is_date_invalid().then_some(INVALID_DATE_MESSAGE)
    }

    pub fn can_print(&self) -> bool {
        !self.is_date_invalid()
    }

    pub fn print_tooltip(&self) -> &'static str {
        if self.is_date_invalid() {
            PRINT_DISABLED_TOOLTIP
        } else {
            PRINT_TOOLTIP
        }
    }

    /// Applies a keystroke-level edit to one field.
    ///
    /// Date fields are masked to `DD/MM/YYYY`. The certificate text is recomputed,
    /// discarding any direct edits, and the start date is revalidated.
    pub fn update_field(&mut self, field: FormField, value: &str) {
        let value = if field.is_date() {
            mask_date_input(value)
        } else {
            value.to_string()
        };
        *self.data.slot(field) = value;
        self.recompute();
    }

    /// Replaces the certificate text with a direct edit. Line breaks become spaces.
    pub fn edit_generated_text(&mut self, value: &str) {
        self.generated_text = value.replace(['\r', '\n'], " ");
    }

    /// Resets every field (issue date back to `today`), drops all referral requests and
    /// clears the invalid-date flag.
    pub fn clear(&mut self, today: impl Into<String>) {
        self.data = FormData::blank(today);
        self.requests.clear();
        self.recompute();
        self.notice = Some(Notice::success(FORM_CLEARED_NOTICE));
    }

    pub fn add_request(&mut self) -> usize {
        self.requests.add()
    }

    pub fn duplicate_request(&mut self, index: usize) -> AtestadoResult<usize> {
        self.requests.duplicate(index)
    }

    pub fn remove_request(&mut self, index: usize) -> AtestadoResult<()> {
        self.requests.remove(index).map(|_| ())
    }

    /// Edits one field of a referral request. A rejected line break raises an error notice.
    pub fn update_request(
        &mut self,
        index: usize,
        field: RequestField,
        value: &str,
    ) -> AtestadoResult<()> {
        let result = self.requests.update(index, field, value);
        if let Err(AtestadoError::LineBreakNotAllowed(_)) = &result {
            self.notice = Some(Notice::error(LINE_BREAK_NOTICE));
        }
        result
    }

    fn recompute(&mut self) {
        self.generated_text = render_certificate_text(&self.data);
        self.start_date_status = DateStatus::of(&self.data.start_date);
    }
}
