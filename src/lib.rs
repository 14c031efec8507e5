pub mod error;

pub mod config {
    pub mod config;
    pub mod ports;
}

pub mod service {
    pub mod config_service;
    pub mod file_service;
    pub mod output_service;
    pub mod registry;
    pub mod traits {
        pub mod i_service;
    }
}

pub mod facade {
    pub mod conversion_facade;
    pub mod session;
    pub mod traits {
        pub mod i_conversion;
    }
}

pub mod models {
    pub mod blob;
    pub mod conversion;
    pub mod file;
    pub mod options;
}

pub mod converters {
    pub mod archive;
    pub mod certificate;
    pub mod color;
    pub mod data;
    pub mod document;
    pub mod images;
    pub mod pdf;
    pub mod pdf_engine;
    pub mod pdf_export;
    pub mod pdf_render;
    pub mod pdf_text;
    pub mod pdf_word;
    pub mod spreadsheet;
    pub mod text;
    pub mod utility;
}

pub mod action {
    pub mod cli;
    pub mod interactive;
}

pub mod utils {
    pub mod file;
    pub mod naming;
    pub mod utils;
}
