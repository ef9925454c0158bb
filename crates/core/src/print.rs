//! Printable certificate rendering.
//!
//! Printing works on two page fragments looked up by element id: the certificate preview
//! container and the print-style template. Both are assembled into a standalone HTML
//! document that opens the print dialog as soon as it loads and closes itself afterwards.

use crate::config::CoreConfig;
use crate::constants::{INSTITUTION_ADDRESS, INSTITUTION_LOGO_URL, LEGAL_DISCLAIMER};
use crate::date::LongDate;
use crate::form::FormData;
use crate::template::render_certificate_text;
use crate::{AtestadoError, AtestadoResult};
use std::collections::HashMap;

pub const PRINTABLE_CONTAINER_ID: &str = "printable-container";
pub const PRINT_STYLES_TEMPLATE_ID: &str = "print-styles-template";
pub const PRINT_TITLE: &str = "Imprimir Atestado Médico";

const PRINT_ON_LOAD_SCRIPT: &str =
    "window.onload = () => { window.focus(); window.print(); window.close(); };";

const PRINT_STYLES: &str = r#"<style>
  @page { size: A4; margin: 0; }
  html, body { margin: 0; padding: 0; background: #fff; }
  #printable-container .printable-page {
    width: 210mm;
    height: 297mm;
    max-width: none;
    box-shadow: none;
    margin: 0;
    page-break-after: avoid;
  }
  @media print {
    body { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
  }
</style>"#;

/// Page fragments addressable by element id.
#[derive(Debug, Clone, Default)]
pub struct PageFragments {
    by_id: HashMap<&'static str, String>,
}

impl PageFragments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &'static str, markup: impl Into<String>) {
        self.by_id.insert(id, markup.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }
}

/// Fragments for the current form: the preview container and the print styles.
pub fn page_fragments(form: &FormData, generated_text: &str, config: &CoreConfig) -> PageFragments {
    let mut fragments = PageFragments::new();
    fragments.insert(
        PRINTABLE_CONTAINER_ID,
        render_preview(form, generated_text, config),
    );
    fragments.insert(PRINT_STYLES_TEMPLATE_ID, PRINT_STYLES);
    fragments
}

/// Renders the certificate page markup.
///
/// The body is the (possibly hand-edited) generated text. An empty text falls back to a
/// fresh rendering of the form so the printout is never blank.
pub fn render_preview(form: &FormData, generated_text: &str, config: &CoreConfig) -> String {
    let body = if generated_text.is_empty() {
        render_certificate_text(form)
    } else {
        generated_text.to_string()
    };
    let date = LongDate::from_masked(&form.attestation_date);

    format!(
        r#"<div id="{container_id}">
  <div class="printable-page bg-white text-black p-4 mx-auto w-full max-w-[210mm] aspect-[210/297] shadow-2xl">
    <div class="flex flex-col p-6 h-full font-serif text-base">
      <header class="flex flex-col justify-center items-center pb-4 border-b-2 border-black" style="min-height: 5rem">
        <div class="h-20 flex justify-center items-center overflow-hidden">
          <img src="{logo}" alt="Logo Ebserh" class="h-full">
        </div>
        <p class="text-[10px] text-center mt-2">{address}</p>
      </header>
      <h1 class="text-center font-bold text-xl my-8 underline uppercase tracking-widest">Atestado Médico</h1>
      <section class="flex-grow text-justify leading-loose p-2">
        <p style="text-indent: 3em">{body}</p>
      </section>
      <footer class="text-sm">
        <p class="text-right mb-12">{locality}, {day} de {month} de {year}.</p>
        <div class="flex flex-col items-center my-8 space-y-1">
          <div class="w-4/5 border-b border-solid border-black"></div>
          <p class="text-normal font-bold">Médico/CRM</p>
        </div>
        <div class="w-full border-b-2 border-solid border-black my-4"></div>
        <p class="text-sm text-center italic mt-4">{disclaimer}</p>
      </footer>
    </div>
  </div>
</div>"#,
        container_id = PRINTABLE_CONTAINER_ID,
        logo = escape_html(INSTITUTION_LOGO_URL),
        address = escape_html(INSTITUTION_ADDRESS),
        body = escape_html(&body),
        locality = escape_html(config.locality()),
        day = escape_html(&date.day),
        month = escape_html(&date.month),
        year = escape_html(&date.year),
        disclaimer = escape_html(LEGAL_DISCLAIMER),
    )
}

/// Assembles the standalone print document from the page fragments.
///
/// # Errors
///
/// Returns `AtestadoError::MissingPrintElement` if the preview container or the
/// print-style template is not among the fragments.
pub fn render_print_document(
    fragments: &PageFragments,
    config: &CoreConfig,
) -> AtestadoResult<String> {
    let container = fragments
        .get(PRINTABLE_CONTAINER_ID)
        .ok_or_else(|| missing_element(PRINTABLE_CONTAINER_ID))?;
    let styles = fragments
        .get(PRINT_STYLES_TEMPLATE_ID)
        .ok_or_else(|| missing_element(PRINT_STYLES_TEMPLATE_ID))?;

    Ok(format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<script src=\"{script}\"></script>\n{styles}\n</head>\n<body>\n{container}\n<script>{on_load}</script>\n</body>\n</html>\n",
        title = PRINT_TITLE,
        script = escape_html(config.style_script_url()),
        styles = styles,
        container = container,
        on_load = PRINT_ON_LOAD_SCRIPT,
    ))
}

/// Renders the print document straight from form values.
pub fn print_document(
    form: &FormData,
    generated_text: &str,
    config: &CoreConfig,
) -> AtestadoResult<String> {
    render_print_document(&page_fragments(form, generated_text, config), config)
}

fn missing_element(id: &'static str) -> AtestadoError {
    tracing::error!(element = id, "print element or style template not found");
    AtestadoError::MissingPrintElement(id)
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CoreConfig {
        CoreConfig::from_env_values(None, None, None, None).unwrap()
    }

    fn filled_form() -> FormData {
        FormData {
            patient_name: "Ana <Souza>".into(),
            patient_id: "123".into(),
            cid: "J11".into(),
            days_off_numeric: "2".into(),
            start_date: "18/10/2026".into(),
            attestation_date: "18/10/2026".into(),
        }
    }

    #[test]
    fn test_preview_uses_generated_text_and_escapes_it() {
        let html = render_preview(&filled_form(), "Texto & <b>editado</b>", &config());
        assert!(html.contains("Texto &amp; &lt;b&gt;editado&lt;/b&gt;"));
        assert!(!html.contains("<b>editado</b>"));
    }

    #[test]
    fn test_preview_falls_back_to_template_when_text_is_empty() {
        let html = render_preview(&filled_form(), "", &config());
        assert!(html.contains("interessado(a) Ana &lt;Souza&gt;,"));
        assert!(html.contains("durante 02 (dois) dias"));
    }

    #[test]
    fn test_preview_footer_date_line() {
        let html = render_preview(&filled_form(), "x", &config());
        assert!(html.contains("Goiânia/GO, 18 de outubro de 2026."));

        let mut form = filled_form();
        form.attestation_date = "18/10".into();
        let html = render_preview(&form, "x", &config());
        assert!(html.contains("Goiânia/GO, __ de ______ de ____."));
    }

    #[test]
    fn test_print_document_wraps_preview() {
        let doc = print_document(&filled_form(), "Corpo", &config()).unwrap();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>Imprimir Atestado Médico</title>"));
        assert!(doc.contains("<script src=\"https://cdn.tailwindcss.com\"></script>"));
        assert!(doc.contains("@page { size: A4; margin: 0; }"));
        assert!(doc.contains("<div id=\"printable-container\">"));
        assert!(doc.contains("window.print()"));
    }

    #[test]
    fn test_missing_container_aborts() {
        let cfg = config();
        let mut fragments = PageFragments::new();
        fragments.insert(PRINT_STYLES_TEMPLATE_ID, PRINT_STYLES);
        assert!(matches!(
            render_print_document(&fragments, &cfg),
            Err(AtestadoError::MissingPrintElement("printable-container"))
        ));
    }

    #[test]
    fn test_missing_style_template_aborts() {
        let cfg = config();
        let mut fragments = PageFragments::new();
        fragments.insert(
            PRINTABLE_CONTAINER_ID,
            render_preview(&filled_form(), "Corpo", &cfg),
        );
        assert!(matches!(
            render_print_document(&fragments, &cfg),
            Err(AtestadoError::MissingPrintElement("print-styles-template"))
        ));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }
}
