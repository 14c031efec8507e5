use std::io;

use crate::models::conversion::{ConversionInput, ConversionOutput};

// Facade 接口，負責協調讀取、轉換與輸出流程
pub trait ConversionFacadeTrait: Send + Sync {
    /// 執行一次轉換並寫出結果
    /// # 參數
    /// - input: 轉換 id、輸入來源、選項與輸出目錄
    /// # 回傳
    /// - 成功時返回寫出的檔案清單，失敗時返回 IO 錯誤
    fn execute_conversion(&self, input: ConversionInput) -> io::Result<ConversionOutput>;
}
