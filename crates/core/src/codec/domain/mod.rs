pub mod image_codec;
