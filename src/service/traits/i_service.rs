use std::io;

use crate::models::file::{FileCollectInput, FileCollectOutput, OutputWriteInput, OutputWriteOutput};

// File 服務接口，負責讀取輸入檔案
pub trait FileServiceTrait: Send + Sync {
    /// 讀取輸入檔案，目錄會遞迴展開
    /// # 參數
    /// - input: 檔案收集的輸入參數
    /// # 回傳
    /// - 成功時返回讀入記憶體的檔案與總大小，失敗時返回 IO 錯誤
    fn collect_files(&self, input: FileCollectInput) -> io::Result<FileCollectOutput>;
}

// Output 服務接口，負責把轉換結果寫入輸出目錄
pub trait OutputServiceTrait: Send + Sync {
    /// 依檔名規則寫出單一或多個輸出
    /// # 參數
    /// - input: 轉換結果與輸出目錄
    /// # 回傳
    /// - 成功時返回寫出的檔案路徑與總大小，失敗時返回 IO 錯誤
    fn write_outputs(&self, input: OutputWriteInput) -> io::Result<OutputWriteOutput>;
}
