//! WASM bindings for ZK-ID date-of-birth extraction.
//!
//! Recognition happens in JavaScript (e.g. tesseract.js); these bindings pull
//! the date of birth out of the recognized text and keep the upload page state.

use js_sys::{Function, Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use zkid_core::{
    find_all_dates, find_date_of_birth, DateOfBirth, ExtractionOutcome, OcrError, PublicKey,
    RequestToken, StaticWallet, UploadSession, WalletStatus,
};

/// Language passed to the JavaScript recognizer when the caller gives none.
///
/// A Tesseract language id, unrelated to the native model-set names.
pub const BROWSER_LANGUAGE: &str = "eng";

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// First date-like substring in recognized text, if any.
#[wasm_bindgen]
pub fn extract_dob_from_text(text: &str) -> Option<String> {
    find_date_of_birth(text).map(String::from)
}

/// Extract the date of birth together with the other candidates and calendar warnings.
#[wasm_bindgen]
pub fn scan_text(text: &str) -> Result<JsValue, JsValue> {
    #[derive(serde::Serialize)]
    struct ScanResult {
        date_of_birth: Option<DateOfBirth>,
        other_candidates: Vec<DateOfBirth>,
        warnings: Vec<String>,
    }

    let mut candidates = find_all_dates(text).into_iter();
    let date_of_birth = candidates.next();
    let warnings = date_of_birth
        .as_ref()
        .map(DateOfBirth::calendar_warnings)
        .unwrap_or_default();

    let output = ScanResult {
        date_of_birth,
        other_candidates: candidates.collect(),
        warnings,
    };

    serde_wasm_bindgen::to_value(&output).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Run a JavaScript recognizer over an image and extract the date of birth.
///
/// `recognize(image, language)` may return text or a Promise of text. Any
/// failure is logged to the console and yields `null`.
#[wasm_bindgen]
pub async fn extract_dob(image: Uint8Array, recognize: Function, language: Option<String>) -> JsValue {
    let language = language.unwrap_or_else(|| BROWSER_LANGUAGE.to_string());

    match recognize_text(&image, &recognize, &language).await {
        Ok(text) => find_date_of_birth(&text)
            .map(|date| JsValue::from_str(date.as_str()))
            .unwrap_or(JsValue::NULL),
        Err(e) => {
            web_sys::console::error_1(&JsValue::from_str(&format!("OCR error: {}", e)));
            JsValue::NULL
        }
    }
}

async fn recognize_text(
    image: &Uint8Array,
    recognize: &Function,
    language: &str,
) -> Result<String, OcrError> {
    let value = recognize
        .call2(&JsValue::NULL, image, &JsValue::from_str(language))
        .map_err(js_error)?;
    let value = JsFuture::from(Promise::resolve(&value))
        .await
        .map_err(js_error)?;

    value
        .as_string()
        .ok_or_else(|| OcrError::Recognition("recognizer did not return text".to_string()))
}

fn js_error(value: JsValue) -> OcrError {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value));
    OcrError::Recognition(message)
}

/// Validate a base58 wallet public key.
#[wasm_bindgen]
pub fn validate_public_key(key: &str) -> bool {
    PublicKey::parse(key).is_ok()
}

/// One upload attempt, handed back to [`DobSession`] when recognition ends.
#[wasm_bindgen]
pub struct UploadTicket(RequestToken);

#[wasm_bindgen]
impl UploadTicket {
    /// Attempt number within its session.
    #[wasm_bindgen(getter)]
    pub fn id(&self) -> f64 {
        self.0.id() as f64
    }
}

/// Upload page state for browser use.
#[wasm_bindgen]
pub struct DobSession {
    session: UploadSession,
    wallet: StaticWallet,
}

#[wasm_bindgen]
impl DobSession {
    /// Create an idle session with no wallet connected.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            session: UploadSession::new(),
            wallet: StaticWallet::disconnected(),
        }
    }

    /// Start an upload. Results of earlier uploads are ignored from now on.
    #[wasm_bindgen]
    pub fn begin(&mut self) -> UploadTicket {
        UploadTicket(self.session.begin())
    }

    /// Finish an upload with the text the recognizer produced.
    ///
    /// Returns `false` when the ticket has been superseded.
    #[wasm_bindgen]
    pub fn complete_with_text(&mut self, ticket: &UploadTicket, text: &str) -> bool {
        let outcome = match find_date_of_birth(text) {
            Some(date) => ExtractionOutcome::Found(date),
            None => ExtractionOutcome::NotFound,
        };
        self.session.complete(ticket.0, outcome)
    }

    /// Finish an upload whose recognition failed.
    #[wasm_bindgen]
    pub fn complete_with_error(&mut self, ticket: &UploadTicket, reason: &str) -> bool {
        web_sys::console::error_1(&JsValue::from_str(&format!("OCR error: {}", reason)));
        self.session
            .complete(ticket.0, ExtractionOutcome::Failed(reason.to_string()))
    }

    /// Text for the result area.
    #[wasm_bindgen]
    pub fn message(&self) -> String {
        self.session.message()
    }

    #[wasm_bindgen]
    pub fn is_processing(&self) -> bool {
        self.session.state().is_processing()
    }

    /// Current display state as `{ state, date_of_birth? }`.
    #[wasm_bindgen]
    pub fn state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.session.state())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Connect a wallet by public key, or disconnect with `null` / empty.
    #[wasm_bindgen]
    pub fn set_wallet(&mut self, public_key: Option<String>) -> Result<(), JsValue> {
        self.wallet = StaticWallet::from_optional(public_key.as_deref())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    /// `Connected: <key>` or `Wallet not connected`.
    #[wasm_bindgen]
    pub fn wallet_label(&self) -> String {
        WalletStatus::of(&self.wallet).label()
    }
}

impl Default for DobSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const KEY: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

    #[wasm_bindgen_test]
    fn test_extract_dob_from_text() {
        assert_eq!(
            extract_dob_from_text("Name: X\nDOB: 15-08-1995").as_deref(),
            Some("15-08-1995")
        );
        assert_eq!(extract_dob_from_text("1995-08-15"), None);
    }

    #[wasm_bindgen_test]
    fn test_validate_public_key() {
        assert!(validate_public_key(KEY));
        assert!(!validate_public_key("0OIl"));
    }

    #[wasm_bindgen_test]
    fn test_session_latest_upload_wins() {
        let mut session = DobSession::new();
        assert_eq!(session.message(), "No DOB extracted. Try a clearer image.");

        let first = session.begin();
        let second = session.begin();
        assert_eq!(session.message(), "Processing...");

        assert!(session.complete_with_text(&second, "born 01/02/1990"));
        assert!(!session.complete_with_text(&first, "born 03/04/1985"));
        assert_eq!(session.message(), "Extracted Date of Birth: 01/02/1990");
    }

    #[wasm_bindgen_test]
    fn test_session_wallet() {
        let mut session = DobSession::new();
        assert_eq!(session.wallet_label(), "Wallet not connected");

        session.set_wallet(Some(KEY.to_string())).unwrap();
        assert_eq!(session.wallet_label(), format!("Connected: {}", KEY));

        assert!(session.set_wallet(Some("not a key".to_string())).is_err());
    }

    #[wasm_bindgen_test]
    async fn test_extract_dob_with_recognizer() {
        let image = Uint8Array::new_with_length(4);
        let recognize = Function::new_with_args("image, lang", "return Promise.resolve('DOB 01/02/1990');");

        let date = extract_dob(image, recognize, None).await;
        assert_eq!(date.as_string().as_deref(), Some("01/02/1990"));
    }

    #[wasm_bindgen_test]
    async fn test_extract_dob_defaults_to_tesseract_english() {
        let image = Uint8Array::new_with_length(4);
        let recognize = Function::new_with_args(
            "image, lang",
            "return lang === 'eng' ? Promise.resolve('DOB 01/02/1990') : Promise.reject(new Error('no data for ' + lang));",
        );

        let date = extract_dob(image, recognize, None).await;
        assert_eq!(date.as_string().as_deref(), Some("01/02/1990"));
    }

    #[wasm_bindgen_test]
    async fn test_extract_dob_passes_explicit_language() {
        let image = Uint8Array::new_with_length(4);
        let recognize = Function::new_with_args("image, lang", "return 'DOB 03/04/1985 ' + lang;");

        let date = extract_dob(image, recognize, Some("pol".to_string())).await;
        assert_eq!(date.as_string().as_deref(), Some("03/04/1985"));
    }

    #[wasm_bindgen_test]
    async fn test_extract_dob_swallows_failure() {
        let image = Uint8Array::new_with_length(4);
        let recognize = Function::new_with_args("image, lang", "return Promise.reject(new Error('boom'));");

        let date = extract_dob(image, recognize, None).await;
        assert!(date.is_null());
    }
}
