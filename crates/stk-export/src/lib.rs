//! LayerExporter: encodes a finished
//! layer as SVG, DXF, or binary STL and writes it to disk.

pub mod encode;
pub mod error;
pub mod request;

pub use error::ExportError;
pub use request::{CutDirection, ExportShape, FileType, LayerExport, MachiningType, OutlinePoint};

/// Encodes `layer` per its `file_type` and writes the result to
/// `layer.filepath`. STL bytes are passed through as given; SVG and DXF are encoded
/// here from the outline + shape list.
pub fn export(layer: &request::LayerExport) -> Result<(), ExportError> {
    let bytes: Vec<u8> = match layer.file_type {
        request::FileType::Stl => layer.stl_content.clone().ok_or(ExportError::MissingStlContent)?,
        request::FileType::Svg => encode::to_svg(layer)?.into_bytes(),
        request::FileType::Dxf => encode::to_dxf(layer)?,
    };
    std::fs::write(&layer.filepath, bytes).map_err(|source| ExportError::Io { path: layer.filepath.clone(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stl_export_without_content_is_rejected() {
        let layer = request::LayerExport {
            filepath: "/tmp/does-not-matter.stl".into(),
            file_type: request::FileType::Stl,
            machining_type: request::MachiningType::Cut,
            cut_direction: request::CutDirection::Top,
            outline: vec![],
            shapes: vec![],
            layer_thickness: 3.0,
            stl_content: None,
        };
        assert!(matches!(export(&layer), Err(ExportError::MissingStlContent)));
    }

    #[test]
    fn stl_export_writes_the_given_bytes() {
        let dir = std::env::temp_dir().join("stk-export-test-stl");
        let path = dir.join("layer.stl");
        std::fs::create_dir_all(&dir).unwrap();
        let layer = request::LayerExport {
            filepath: path.to_string_lossy().to_string(),
            file_type: request::FileType::Stl,
            machining_type: request::MachiningType::Cut,
            cut_direction: request::CutDirection::Top,
            outline: vec![],
            shapes: vec![],
            layer_thickness: 3.0,
            stl_content: Some(vec![0u8; 84]),
        };
        export(&layer).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written.len(), 84);
        std::fs::remove_dir_all(&dir).ok();
    }
}
