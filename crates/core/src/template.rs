//! Certificate body text.
//!
//! The body is a single fixed sentence with the five form values substituted in. Empty
//! values are replaced by runs of underscores so the printed certificate can still be
//! filled in by hand.

use crate::form::FormData;
use crate::words::{number_to_words, parse_leading_int, NO_WORDS};

/// Patient name placeholder. The zero-width spaces let the line wrap.
pub const NAME_PLACEHOLDER: &str =
    "_____________________________\u{200B}____________________\u{200B}_______";
pub const ID_PLACEHOLDER: &str = "__________________________";
pub const CID_PLACEHOLDER: &str = "______";
pub const DAYS_PLACEHOLDER: &str = "____";
pub const DAYS_WORDS_PLACEHOLDER: &str = "__________";
pub const START_DATE_PLACEHOLDER: &str = "______________________";

/// Renders the certificate sentence for the given form values.
pub fn render_certificate_text(form: &FormData) -> String {
    let patient_name = or_placeholder(&form.patient_name, NAME_PLACEHOLDER);
    let patient_id = or_placeholder(&form.patient_id, ID_PLACEHOLDER);
    let cid = or_placeholder(&form.cid, CID_PLACEHOLDER);
    let days = padded_days(&form.days_off_numeric);
    let words = match number_to_words(&form.days_off_numeric) {
        w if w == NO_WORDS => DAYS_WORDS_PLACEHOLDER.to_string(),
        w => w,
    };
    let start_date = or_placeholder(&form.start_date, START_DATE_PLACEHOLDER);

    format!(
        "A pedido do(a) interessado(a) {patient_name}, Carteira de Identidade e/ou CPF nº {patient_id}, \
         e na qualidade de seu médico assistente, atesto, para os devidos fins, que o(a) mesmo(a), \
         por motivos de doença (CID: {cid}), ficou (ou estará) impossibilitado(a) de exercer suas \
         atividades durante {days} ({words}) dias a partir de {start_date}."
    )
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

/// The raw days value left-padded to two characters, or the placeholder when it does not
/// parse to a positive number.
fn padded_days(raw: &str) -> String {
    if !parse_leading_int(raw).is_some_and(|n| n > 0) {
        return DAYS_PLACEHOLDER.to_string();
    }
    format!("{:0>2}", raw)
}
