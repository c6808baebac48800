//! Page translation widget, injected into rendered pages at most once.

/// Script tags collected while rendering one page, keyed by element id.
#[derive(Debug, Clone, Default)]
pub struct PageScripts {
    scripts: Vec<(String, String)>,
}

impl PageScripts {
    pub fn contains(&self, id: &str) -> bool {
        self.scripts.iter().any(|(existing, _)| existing == id)
    }

    pub fn push(&mut self, id: impl Into<String>, html: impl Into<String>) {
        self.scripts.push((id.into(), html.into()));
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Markup for all collected scripts, in insertion order
    pub fn html(&self) -> String {
        self.scripts
            .iter()
            .map(|(_, html)| html.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub trait TranslationService: Send + Sync {
    /// Element id of the widget's loader script
    fn script_id(&self) -> &str;

    /// Loader markup, including the element with `script_id`
    fn script_html(&self) -> String;

    /// Add the widget to the page unless a script with the same id is present.
    fn inject(&self, page: &mut PageScripts) -> bool {
        if page.contains(self.script_id()) {
            return false;
        }
        page.push(self.script_id(), self.script_html());
        true
    }
}

/// Google Translate website widget.
pub struct GoogleTranslate {
    page_language: String,
}

impl GoogleTranslate {
    pub const SCRIPT_ID: &'static str = "google-translate-script";

    pub fn new(page_language: impl Into<String>) -> Self {
        Self {
            page_language: page_language.into(),
        }
    }
}

impl Default for GoogleTranslate {
    fn default() -> Self {
        Self::new("en")
    }
}

impl TranslationService for GoogleTranslate {
    fn script_id(&self) -> &str {
        Self::SCRIPT_ID
    }

    fn script_html(&self) -> String {
        format!(
            r#"<script>
function googleTranslateElementInit() {{
  new google.translate.TranslateElement({{ pageLanguage: "{lang}" }}, "google_translate_element");
}}
</script>
<script id="{id}" src="https://translate.google.com/translate_a/element.js?cb=googleTranslateElementInit"></script>"#,
            lang = self.page_language,
            id = Self::SCRIPT_ID,
        )
    }
}
