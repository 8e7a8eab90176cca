mod common;
mod decode;
