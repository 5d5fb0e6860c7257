pub mod image_buffer_codec;
