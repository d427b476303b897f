/// STL encoding and decoding
mod export;
mod parse;

pub use export::{
    export_stl, ExportOptions, StlBuffer, StlExport, StlExporter, StlFormat, FACET_LEN,
    HEADER_LEN, PREAMBLE_LEN, SOLID_NAME,
};
pub use parse::{parse_ascii_stl, parse_binary_stl, parse_stl};
