//! Buffer resolution: GLB blob, `data:` URIs and files next to the model.

use std::path::Path;

use super::error::ImportError;

/// Load the bytes of every buffer in `document`, in buffer index order.
///
/// Relative URIs are resolved against `base_dir`. Without a base directory
/// only embedded buffers can be resolved.
pub(super) fn resolve_buffers(
    document: &gltf_dep::Document,
    mut blob: Option<Vec<u8>>,
    base_dir: Option<&Path>,
) -> Result<Vec<Vec<u8>>, ImportError> {
    let mut buffers = Vec::new();

    for buffer in document.buffers() {
        let data = match buffer.source() {
            gltf_dep::buffer::Source::Bin => blob.take().ok_or_else(|| {
                ImportError::Buffer(format!(
                    "buffer {} references the binary chunk but the file has none",
                    buffer.index()
                ))
            })?,
            gltf_dep::buffer::Source::Uri(uri) => match decode_data_uri(uri) {
                Some(data) => data,
                None => read_external(uri, base_dir)?,
            },
        };

        if data.len() < buffer.length() {
            return Err(ImportError::Buffer(format!(
                "buffer {} holds {} bytes, {} declared",
                buffer.index(),
                data.len(),
                buffer.length()
            )));
        }
        buffers.push(data);
    }

    Ok(buffers)
}

fn read_external(uri: &str, base_dir: Option<&Path>) -> Result<Vec<u8>, ImportError> {
    let Some(base_dir) = base_dir else {
        return Err(ImportError::Buffer(format!(
            "external buffer '{uri}' cannot be resolved without a base directory"
        )));
    };
    let path = base_dir.join(uri);
    std::fs::read(&path).map_err(|source| ImportError::Io { path, source })
}

/// Decode a `data:<mime>;base64,<payload>` URI. `None` for any other URI.
pub(super) fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    decode_base64(payload)
}

fn sextet(c: u8) -> Option<u32> {
    let value = match c {
        b'A'..=b'Z' => c - b'A',
        b'a'..=b'z' => c - b'a' + 26,
        b'0'..=b'9' => c - b'0' + 52,
        b'+' | b'-' => 62,
        b'/' | b'_' => 63,
        _ => return None,
    };
    Some(u32::from(value))
}

/// Standard or URL-safe base64, padding optional, whitespace ignored.
fn decode_base64(input: &str) -> Option<Vec<u8>> {
    let symbols: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .take_while(|&b| b != b'=')
        .collect();

    let mut out = Vec::with_capacity(symbols.len() * 3 / 4);
    for group in symbols.chunks(4) {
        if group.len() == 1 {
            return None;
        }
        let mut bits = 0u32;
        for (i, &c) in group.iter().enumerate() {
            bits |= sextet(c)? << (18 - 6 * i);
        }
        let bytes = bits.to_be_bytes();
        out.extend_from_slice(&bytes[1..group.len()]);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("SGVsbG8gV29ybGQ=", b"Hello World".as_slice())]
    #[case("YQ==", b"a".as_slice())]
    #[case("YWI", b"ab".as_slice())]
    #[case("", b"".as_slice())]
    fn base64_payloads(#[case] encoded: &str, #[case] expected: &[u8]) {
        assert_eq!(decode_base64(encoded).unwrap(), expected);
    }

    #[test]
    fn rejects_invalid_symbols() {
        assert!(decode_base64("ab*d").is_none());
    }

    #[test]
    fn data_uri() {
        let data = decode_data_uri("data:application/octet-stream;base64,AQID").unwrap();
        assert_eq!(data, vec![1, 2, 3]);
        assert!(decode_data_uri("textures/albedo.png").is_none());
    }
}
