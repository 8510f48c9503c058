//! CancerX Common Library
//!
//! CLIとセッションコアで共有される型・プロンプト・パーサー

pub mod types;
pub mod classifier;
pub mod error;
pub mod geometry;
pub mod parser;
pub mod prompts;

pub use types::{
    AnalysisContext, Biomarker, CaseCategory, CaseResult, ChatMessage, ChatRole,
    DocumentAnalysis, ImageAnalysis, RegionOfInterest,
};
pub use classifier::{classify, is_supported, SUPPORTED_DOC_TYPES, SUPPORTED_IMG_TYPES};
pub use error::{Error, Result};
pub use geometry::{fit_contain, PixelRect, Size};
pub use parser::{extract_json, parse_document_analysis, parse_image_analysis};
pub use prompts::{
    build_chat_prompt, build_synthesis_prompt, document_response_schema, image_response_schema,
    DOCUMENT_ANALYSIS_PROMPT, IMAGE_ANALYSIS_PROMPT, NO_SYNTHESIS_DATA_MESSAGE, SYNTHESIS_SECTIONS,
};
