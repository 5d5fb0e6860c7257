pub mod outline_painter;
