pub mod annotate_image_use_case;
pub mod batch_report;
pub mod detect_batch_use_case;
pub mod image_failure;
pub mod infrastructure;
pub mod output_namer;
pub mod pipeline_executor;
pub mod pipeline_logger;
