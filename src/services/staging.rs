use serde::{Deserialize, Serialize};

/// File name given to the canned CSV sample.
pub const SAMPLE_FILE_NAME: &str = "sample_logs.csv";

pub const SAMPLE_CSV_DATA: &str = "username,ip_address,timestamp,location,device,login_status
john_doe,192.168.1.100,2024-01-15 09:15:23,New York,Chrome/Windows,success
jane_smith,10.0.0.55,2024-01-15 14:30:45,London,Firefox/macOS,success
admin_user,203.0.113.45,2024-01-15 23:45:12,Tokyo,Chrome/Linux,failed
john_doe,198.51.100.78,2024-01-16 02:15:30,Moscow,Safari/iOS,success
test_user,192.168.1.100,2024-01-16 08:30:15,New York,Chrome/Windows,failed";

/// Pipe-delimited: timestamp|username|ip_address|location|device|login_status
pub const SAMPLE_RAW_DATA: &str = "2024-01-15 09:15:23|john_doe|192.168.1.100|New York|Chrome/Windows|success
2024-01-15 14:30:45|jane_smith|10.0.0.55|London|Firefox/macOS|success
2024-01-15 23:45:12|admin_user|203.0.113.45|Tokyo|Chrome/Linux|failed
2024-01-16 02:15:30|john_doe|198.51.100.78|Moscow|Safari/iOS|success
2024-01-16 08:30:15|test_user|192.168.1.100|New York|Chrome/Windows|failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Upload,
    Raw,
}

impl InputMode {
    pub fn from_str_value(s: &str) -> Option<Self> {
        match s {
            "upload" => Some(Self::Upload),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }
}

/// An in-memory file ready to be sent as multipart content.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            content,
        }
    }

    pub fn csv(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, "text/csv", text.as_bytes().to_vec())
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Copy of the staged input taken at submission time.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedInput {
    pub mode: InputMode,
    pub file: Option<StagedFile>,
    pub raw_text: String,
}

/// Holds what the operator has staged for analysis in each input mode.
///
/// Both modes keep their content independently, so switching tabs never
/// loses work.
#[derive(Debug, Default)]
pub struct InputStagingStore {
    mode: InputMode,
    file: Option<StagedFile>,
    raw_text: String,
}

impl InputStagingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn file(&self) -> Option<&StagedFile> {
        self.file.as_ref()
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn select_mode(&mut self, mode: InputMode) {
        self.mode = mode;
    }

    pub fn stage_file(&mut self, file: StagedFile) {
        self.file = Some(file);
    }

    /// Stored verbatim: no trimming, no validation.
    pub fn stage_raw_text(&mut self, text: impl Into<String>) {
        self.raw_text = text.into();
    }

    pub fn load_sample(&mut self) {
        match self.mode {
            InputMode::Raw => self.raw_text = SAMPLE_RAW_DATA.to_string(),
            InputMode::Upload => {
                self.file = Some(StagedFile::csv(SAMPLE_FILE_NAME, SAMPLE_CSV_DATA));
            }
        }
    }

    /// Clears staged content. The active tab is kept.
    pub fn reset(&mut self) {
        self.file = None;
        self.raw_text.clear();
    }

    pub fn snapshot(&self) -> StagedInput {
        StagedInput {
            mode: self.mode,
            file: self.file.clone(),
            raw_text: self.raw_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switching_modes_keeps_both_inputs() {
        let mut store = InputStagingStore::new();
        store.stage_file(StagedFile::csv("logins.csv", "username\nalice"));
        store.select_mode(InputMode::Raw);
        store.stage_raw_text("line one");
        store.select_mode(InputMode::Upload);

        assert_eq!(store.file().map(|f| f.name.as_str()), Some("logins.csv"));
        assert_eq!(store.raw_text(), "line one");
    }

    #[test]
    fn test_stage_file_replaces_previous() {
        let mut store = InputStagingStore::new();
        store.stage_file(StagedFile::csv("a.csv", "a"));
        store.stage_file(StagedFile::csv("b.csv", "b"));
        assert_eq!(store.file().unwrap().name, "b.csv");
    }

    #[test]
    fn test_raw_text_is_stored_verbatim() {
        let mut store = InputStagingStore::new();
        store.stage_raw_text("  padded \n\n");
        assert_eq!(store.raw_text(), "  padded \n\n");
    }

    #[test]
    fn test_load_sample_in_upload_mode_stages_csv_file() {
        let mut store = InputStagingStore::new();
        store.load_sample();

        let file = store.file().expect("sample file staged");
        assert_eq!(file.name, SAMPLE_FILE_NAME);
        assert_eq!(file.content_type, "text/csv");
        assert_eq!(file.content, SAMPLE_CSV_DATA.as_bytes());
        assert!(store.raw_text().is_empty());
    }

    #[test]
    fn test_load_sample_in_upload_mode_replaces_selected_file() {
        let mut store = InputStagingStore::new();
        store.stage_file(StagedFile::csv("mine.csv", "username"));
        store.load_sample();
        assert_eq!(store.file().unwrap().name, "sample_logs.csv");
    }

    #[test]
    fn test_load_sample_in_raw_mode_overwrites_text_only() {
        let mut store = InputStagingStore::new();
        store.stage_file(StagedFile::csv("mine.csv", "username"));
        store.select_mode(InputMode::Raw);
        store.stage_raw_text("draft");
        store.load_sample();

        assert_eq!(store.raw_text(), SAMPLE_RAW_DATA);
        assert_eq!(store.file().unwrap().name, "mine.csv");
    }

    #[test]
    fn test_reset_clears_everything_staged() {
        let mut store = InputStagingStore::new();
        store.stage_file(StagedFile::csv("a.csv", "a"));
        store.select_mode(InputMode::Raw);
        store.stage_raw_text("text");
        store.reset();

        assert!(store.file().is_none());
        assert!(store.raw_text().is_empty());
    }
}
