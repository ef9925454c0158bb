//! Constants used throughout the Atestado core crate.
//!
//! This module contains the fixed certificate wording, placeholders, field caps and
//! default endpoints so that they are defined in exactly one place.

use std::time::Duration;

/// Default ICD-10 search endpoint used for CID suggestions.
pub const DEFAULT_CID_SEARCH_URL: &str = "https://clinicaltables.nlm.nih.gov/api/icd10cm/v3/search";

/// Fields requested from the CID search endpoint (`sf` query parameter).
pub const CID_SEARCH_FIELDS: &str = "code,name";

/// Quiescence window before a CID search is issued.
pub const DEFAULT_CID_DEBOUNCE_MS: u64 = 500;

/// Idle time after which an untouched form session is dropped.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// Shortest free-text query that triggers a CID search.
pub const MIN_CID_SEARCH_LEN: usize = 3;

/// Timeout applied to a single CID search request.
pub const CID_SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default locality printed before the attestation date.
pub const DEFAULT_LOCALITY: &str = "Goiânia/GO";

/// Default style script loaded by the print document.
pub const DEFAULT_STYLE_SCRIPT_URL: &str = "https://cdn.tailwindcss.com";

/// Institution logo shown in the certificate header.
pub const INSTITUTION_LOGO_URL: &str = "https://i.imgur.com/LoP97om.png";

/// Institution address line shown under the logo.
pub const INSTITUTION_ADDRESS: &str = "Rua 235, nº 285, Quadra 68, Lote Área, s/nº, Setor Leste Universitário - Fone: (62) 3269-8200 - Goiânia - GO, 74605-050";

/// Legal disclaimer printed at the foot of every certificate.
pub const LEGAL_DISCLAIMER: &str = "\"O presente atestado é fornecido com ciência dos dispositivos legais vigentes (Código Penal, Artigo 302), encontrando-se laudo detalhado sobre o caso à disposição a quem de direito possa interessar.\"";

/// Character cap for the referral origin sector.
pub const ORIGIN_SECTOR_MAX: usize = 41;

/// Character cap for the referral target service.
pub const REFERRAL_SERVICE_MAX: usize = 37;

/// Character cap for the referral clinical summary.
pub const CLINICAL_SUMMARY_MAX: usize = 517;

/// How long a notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Portuguese month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Inline message shown under an invalid start date.
pub const INVALID_DATE_MESSAGE: &str = "Data inválida. Use o formato DD/MM/AAAA.";

/// Print button tooltip while the start date is invalid.
pub const PRINT_DISABLED_TOOLTIP: &str = "A data de início do afastamento é inválida.";

/// Print button tooltip otherwise.
pub const PRINT_TOOLTIP: &str = "Imprimir Atestado";

/// Alert shown when the print document cannot be assembled.
pub const PRINT_FAILURE_ALERT: &str =
    "Ocorreu um erro ao tentar preparar a impressão. Por favor, recarregue a página.";

/// Notice shown after the form is cleared.
pub const FORM_CLEARED_NOTICE: &str = "Formulário limpo com sucesso!";

/// Notice shown when a line break is typed into a clinical summary.
pub const LINE_BREAK_NOTICE: &str = "Quebras de linha não são permitidas.";
