//! 一次轉換的工作階段：收集輸入、執行、保存結果。
//!
//! 狀態流程：`Idle → ReadyToConvert → Converting → DoneSingle | DoneMulti`。
//! 轉換失敗時回到 `Idle` 但保留已提供的輸入，`reset` 則全部清除。

use log::{debug, info};

use crate::error::{ConvertError, ConvertResult};
use crate::models::blob::InputFile;
use crate::models::conversion::{ConversionRequest, ConversionResult};
use crate::models::options::ConversionOptions;
use crate::service::registry::{dispatch, ConversionDescriptor, InputKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    ReadyToConvert,
    Converting,
    DoneSingle,
    DoneMulti,
}

pub struct ConversionSession {
    descriptor: &'static ConversionDescriptor,
    files: Vec<InputFile>,
    text: Option<String>,
    options: ConversionOptions,
    state: SessionState,
    result: Option<ConversionResult>,
}

impl ConversionSession {
    pub fn new(descriptor: &'static ConversionDescriptor) -> Self {
        let mut session = ConversionSession {
            descriptor,
            files: Vec::new(),
            text: None,
            options: ConversionOptions::default(),
            state: SessionState::Idle,
            result: None,
        };
        session.refresh_state();
        session
    }

    pub fn descriptor(&self) -> &'static ConversionDescriptor {
        self.descriptor
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    pub fn result(&self) -> Option<&ConversionResult> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<ConversionResult> {
        self.result.take()
    }

    pub fn has_input(&self) -> bool {
        match self.descriptor.input {
            InputKind::Nothing => true,
            InputKind::Text => self.text.as_ref().is_some_and(|t| !t.is_empty()) || !self.files.is_empty(),
            InputKind::Files { min, .. } => self.files.len() >= min,
        }
    }

    /// 加入輸入檔案；單檔轉換只保留最新的一個
    pub fn add_files(&mut self, files: Vec<InputFile>) {
        if self.descriptor.accepts_multiple() {
            self.files.extend(files);
        } else if let Some(last) = files.into_iter().last() {
            self.files = vec![last];
        }
        self.clear_result();
        self.refresh_state();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
        self.clear_result();
        self.refresh_state();
    }

    pub fn set_options(&mut self, options: ConversionOptions) {
        self.options = options;
    }

    pub fn reset(&mut self) {
        self.files.clear();
        self.text = None;
        self.result = None;
        self.state = SessionState::Idle;
        self.refresh_state();
    }

    fn clear_result(&mut self) {
        if matches!(self.state, SessionState::DoneSingle | SessionState::DoneMulti) {
            self.result = None;
        }
    }

    fn refresh_state(&mut self) {
        if self.state == SessionState::Converting {
            return;
        }
        if self.result.is_none() {
            self.state = if self.has_input() {
                SessionState::ReadyToConvert
            } else {
                SessionState::Idle
            };
        }
    }

    /// 進入 `Converting` 並交出本次請求；轉換中不可重複開始
    pub fn begin(&mut self) -> ConvertResult<ConversionRequest> {
        if self.state == SessionState::Converting {
            return Err(ConvertError::InvalidInput("轉換進行中，請稍候".to_string()));
        }
        if !self.has_input() {
            return Err(ConvertError::InvalidInput(format!("{} 尚未提供輸入", self.descriptor.id)));
        }
        self.result = None;
        self.state = SessionState::Converting;
        let mut request = ConversionRequest::new(self.descriptor);
        request.files = std::mem::take(&mut self.files);
        request.text = self.text.clone();
        request.options = self.options.clone();
        Ok(request)
    }

    /// 收回請求中的輸入並記錄結果
    pub fn finish(
        &mut self,
        request: ConversionRequest,
        outcome: ConvertResult<ConversionResult>,
    ) -> ConvertResult<&ConversionResult> {
        self.files = request.files;
        match outcome {
            Ok(result) => {
                self.state = match result {
                    ConversionResult::Single(_) => SessionState::DoneSingle,
                    ConversionResult::Multiple(_) => SessionState::DoneMulti,
                };
                info!("{} 完成，共 {} 個輸出", self.descriptor.id, result.output_count());
                let stored: &ConversionResult = self.result.insert(result);
                Ok(stored)
            }
            Err(e) => {
                debug!("{} 轉換失敗，回到待命狀態", self.descriptor.id);
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    pub fn convert(&mut self) -> ConvertResult<&ConversionResult> {
        let request = self.begin()?;
        let outcome = dispatch(&request);
        self.finish(request, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::registry::get_conversion_by_id;

    fn session(id: &str) -> ConversionSession {
        ConversionSession::new(get_conversion_by_id(id).unwrap())
    }

    #[test]
    fn text_input_makes_session_ready() {
        let mut s = session("case-converter-upper");
        assert_eq!(s.state(), SessionState::Idle);
        s.set_text("hello");
        assert_eq!(s.state(), SessionState::ReadyToConvert);
        let result = s.convert().unwrap();
        assert_eq!(result.output_count(), 1);
        assert_eq!(s.state(), SessionState::DoneSingle);
        assert_eq!(s.take_result().unwrap().into_single().unwrap().bytes, b"HELLO");
    }

    #[test]
    fn generators_start_ready() {
        let mut s = session("lorem-ipsum");
        assert_eq!(s.state(), SessionState::ReadyToConvert);
        s.convert().unwrap();
        assert_eq!(s.state(), SessionState::DoneSingle);
    }

    #[test]
    fn failure_returns_to_idle_and_keeps_inputs() {
        let mut s = session("json-to-csv");
        s.add_files(vec![InputFile::new("bad.json", b"{ nope".to_vec())]);
        assert_eq!(s.state(), SessionState::ReadyToConvert);
        assert!(s.convert().is_err());
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.files().len(), 1);
        assert!(s.result().is_none());
    }

    #[test]
    fn multi_output_and_reset() {
        let mut s = session("extract-tar");
        let archive = crate::converters::archive::create_tar(&[
            InputFile::new("a.txt", b"a".to_vec()),
            InputFile::new("b.txt", b"b".to_vec()),
        ])
        .unwrap();
        s.add_files(vec![InputFile::new("x.tar", archive)]);
        s.convert().unwrap();
        assert_eq!(s.state(), SessionState::DoneMulti);

        s.reset();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.files().is_empty());
        assert!(s.result().is_none());
    }

    #[test]
    fn cannot_start_twice() {
        let mut s = session("reverse-text");
        s.set_text("abc");
        let request = s.begin().unwrap();
        assert_eq!(s.state(), SessionState::Converting);
        assert!(s.begin().is_err());
        let outcome = dispatch(&request);
        s.finish(request, outcome).unwrap();
        assert_eq!(s.state(), SessionState::DoneSingle);
    }

    #[test]
    fn new_input_clears_previous_result() {
        let mut s = session("reverse-text");
        s.set_text("abc");
        s.convert().unwrap();
        s.set_text("xyz");
        assert!(s.result().is_none());
        assert_eq!(s.state(), SessionState::ReadyToConvert);
    }

    #[test]
    fn single_file_conversions_keep_latest_file() {
        let mut s = session("gzip-compress");
        s.add_files(vec![InputFile::new("a.txt", b"a".to_vec())]);
        s.add_files(vec![InputFile::new("b.txt", b"b".to_vec())]);
        assert_eq!(s.files().len(), 1);
        assert_eq!(s.files()[0].name, "b.txt");
    }
}
