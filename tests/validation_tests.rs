#![allow(missing_docs)]

use std::borrow::Cow;

use tensorpack::{serialize, Dtype, TensorPack, TensorPackError, TensorView, View};

// --- HELPERS ---

// Hand-crafts a container from raw header text and a data region.
fn container(header: &str, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + header.len() + data.len());
    out.extend_from_slice(&(header.len() as u64).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(data);
    out
}

// --- DECODE FAILURES ---

/// Two descriptors sharing even one byte must fail, naming both keys.
#[test]
fn test_overlap_rejection() {
    let header = r#"{"a":{"dtype":"U8","shape":[4],"data_offsets":[0,4]},"b":{"dtype":"U8","shape":[4],"data_offsets":[2,6]}}"#;
    let buffer = container(header, &[0u8; 6]);

    match TensorPack::deserialize(&buffer) {
        Err(TensorPackError::OverlappingTensors { first, second }) => {
            assert_eq!(first, "a");
            assert_eq!(second, "b");
        }
        other => panic!("expected OverlappingTensors, got {other:?}"),
    }
}

/// A declared shape whose byte count disagrees with the offset span fails.
#[test]
fn test_shape_mismatch_rejection() {
    let header = r#"{"a":{"dtype":"U8","shape":[5],"data_offsets":[0,4]}}"#;
    let buffer = container(header, &[0u8; 4]);

    match TensorPack::deserialize(&buffer) {
        Err(TensorPackError::ShapeMismatch {
            name,
            expected,
            found,
        }) => {
            assert_eq!(name, "a");
            assert_eq!(expected, 5);
            assert_eq!(found, 4);
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}

/// The maximum end offset must equal the data region actually present.
#[test]
fn test_size_mismatch_rejection() {
    let header = r#"{"a":{"dtype":"U8","shape":[4],"data_offsets":[0,4]}}"#;
    let buffer = container(header, &[0u8; 6]);

    match TensorPack::deserialize(&buffer) {
        Err(TensorPackError::SizeMismatch { declared, actual }) => {
            assert_eq!(declared, 4);
            assert_eq!(actual, 6);
        }
        other => panic!("expected SizeMismatch, got {other:?}"),
    }
}

/// Trailing bytes behind an empty descriptor table are unaccounted for.
#[test]
fn test_trailing_data_rejection() {
    let buffer = container("{}", &[1u8, 2, 3]);

    match TensorPack::deserialize(&buffer) {
        Err(TensorPackError::SizeMismatch { declared, actual }) => {
            assert_eq!(declared, 0);
            assert_eq!(actual, 3);
        }
        other => panic!("expected SizeMismatch, got {other:?}"),
    }
}

/// An empty buffer cannot hold the length prefix, and the error message
/// identifies itself as a deserialization failure.
#[test]
fn test_empty_buffer_rejection() {
    match TensorPack::deserialize(&[]) {
        Err(err @ TensorPackError::MalformedHeader(_)) => {
            assert!(err.to_string().contains("deserializing"));
        }
        other => panic!("expected MalformedHeader, got {other:?}"),
    }
}

/// A buffer shorter than its declared header length fails decode.
#[test]
fn test_truncated_header_rejection() {
    let mut buffer = container(r#"{"a":{"dtype":"U8","shape":[1],"data_offsets":[0,1]}}"#, &[0]);
    buffer.truncate(20);

    assert!(matches!(
        TensorPack::deserialize(&buffer),
        Err(TensorPackError::MalformedHeader(_))
    ));
}

/// A declared header length over the hard cap fails before any allocation.
#[test]
fn test_oversized_header_rejection() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&u64::MAX.to_le_bytes());
    buffer.extend_from_slice(b"{}");

    assert!(matches!(
        TensorPack::deserialize(&buffer),
        Err(TensorPackError::MalformedHeader(_))
    ));
}

/// Header bytes that are not valid UTF-8 fail decode.
#[test]
fn test_invalid_utf8_rejection() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&4u64.to_le_bytes());
    buffer.extend_from_slice(&[0xFF, 0xFE, 0xFD, 0xFC]);

    assert!(matches!(
        TensorPack::deserialize(&buffer),
        Err(TensorPackError::MalformedHeader(_))
    ));
}

/// Valid JSON of the wrong shape (not an object of descriptors) fails.
#[test]
fn test_wrong_json_shape_rejection() {
    let buffer = container("[1, 2, 3]", &[]);
    assert!(matches!(
        TensorPack::deserialize(&buffer),
        Err(TensorPackError::MalformedHeader(_))
    ));

    let buffer = container(r#"{"a":{"dtype":"U8"}}"#, &[]);
    assert!(matches!(
        TensorPack::deserialize(&buffer),
        Err(TensorPackError::MalformedHeader(_))
    ));
}

/// Metadata values must be strings.
#[test]
fn test_non_string_metadata_rejection() {
    let buffer = container(r#"{"__metadata__":{"count":3}}"#, &[]);
    assert!(matches!(
        TensorPack::deserialize(&buffer),
        Err(TensorPackError::MalformedHeader(_))
    ));
}

/// A descriptor smuggled under the reserved metadata key is not a tensor.
#[test]
fn test_descriptor_shaped_metadata_rejection() {
    let header = r#"{"__metadata__":{"dtype":"U8","shape":[1],"data_offsets":[0,1]}}"#;
    let buffer = container(header, &[0u8; 1]);

    assert!(matches!(
        TensorPack::deserialize(&buffer),
        Err(TensorPackError::MalformedHeader(_))
    ));
}

/// A dtype tag outside the registry fails with the tag preserved.
#[test]
fn test_unknown_dtype_rejection() {
    let header = r#"{"a":{"dtype":"COMPLEX64","shape":[1],"data_offsets":[0,8]}}"#;
    let buffer = container(header, &[0u8; 8]);

    match TensorPack::deserialize(&buffer) {
        Err(TensorPackError::UnknownDtype(tag)) => assert_eq!(tag, "COMPLEX64"),
        other => panic!("expected UnknownDtype, got {other:?}"),
    }
}

/// A start offset past its end offset fails decode.
#[test]
fn test_inverted_offsets_rejection() {
    let header = r#"{"a":{"dtype":"U8","shape":[2],"data_offsets":[4,2]}}"#;
    let buffer = container(header, &[0u8; 4]);

    assert!(matches!(
        TensorPack::deserialize(&buffer),
        Err(TensorPackError::MalformedHeader(_))
    ));
}

/// Tensor names must be non-empty.
#[test]
fn test_empty_name_rejection() {
    let header = r#"{"":{"dtype":"U8","shape":[1],"data_offsets":[0,1]}}"#;
    let buffer = container(header, &[0u8; 1]);

    assert!(matches!(
        TensorPack::deserialize(&buffer),
        Err(TensorPackError::MalformedHeader(_))
    ));
}

/// Gaps between ranges are tolerated as long as the maximum end matches.
#[test]
fn test_gaps_are_tolerated() -> tensorpack::Result<()> {
    let header = r#"{"a":{"dtype":"U8","shape":[2],"data_offsets":[0,2]},"b":{"dtype":"U8","shape":[2],"data_offsets":[6,8]}}"#;
    let buffer = container(header, &[0u8; 8]);

    let pack = TensorPack::deserialize(&buffer)?;
    assert_eq!(pack.tensor("b")?.data(), &[0u8, 0]);
    Ok(())
}

// --- SAVE-SIDE FAILURES ---

/// Two keys normalizing to the same string are rejected.
#[test]
fn test_duplicate_name_rejection() {
    let data = [0u8; 2];
    let tensors = vec![
        ("t".to_string(), TensorView::new(Dtype::U8, vec![2], &data).unwrap()),
        ("t".to_string(), TensorView::new(Dtype::U8, vec![2], &data).unwrap()),
    ];

    match serialize(tensors, None) {
        Err(TensorPackError::DuplicateTensorName(name)) => assert_eq!(name, "t"),
        other => panic!("expected DuplicateTensorName, got {other:?}"),
    }
}

/// Empty tensor names are rejected before anything is written.
#[test]
fn test_empty_key_rejection() {
    let data = [0u8; 2];
    let tensors = vec![("", TensorView::new(Dtype::U8, vec![2], &data).unwrap())];

    assert!(matches!(
        serialize(tensors, None),
        Err(TensorPackError::InvalidInput(_))
    ));
}

/// The reserved metadata key cannot name a tensor; accepting it would emit
/// a container whose own decode then fails.
#[test]
fn test_reserved_key_rejection() {
    let data = [0u8; 2];
    let tensors = vec![(
        "__metadata__",
        TensorView::new(Dtype::U8, vec![2], &data).unwrap(),
    )];

    assert!(matches!(
        serialize(tensors, None),
        Err(TensorPackError::InvalidInput(_))
    ));
}

/// Two names over the same bytes must fail, naming both keys.
#[test]
fn test_shared_storage_rejection() {
    let backing = vec![0u8; 8];
    let tensors = vec![
        ("w1", TensorView::new(Dtype::U8, vec![8], &backing).unwrap()),
        ("w2", TensorView::new(Dtype::U8, vec![8], &backing).unwrap()),
    ];

    match serialize(tensors, None) {
        Err(TensorPackError::SharedStorage(groups)) => {
            assert_eq!(groups, vec![vec!["w1".to_string(), "w2".to_string()]]);
        }
        other => panic!("expected SharedStorage, got {other:?}"),
    }
}

/// Partial overlap of backing ranges is aliasing too.
#[test]
fn test_partial_overlap_rejection() {
    let backing = vec![0u8; 8];
    let tensors = vec![
        ("head", TensorView::new(Dtype::U8, vec![6], &backing[..6]).unwrap()),
        ("tail", TensorView::new(Dtype::U8, vec![4], &backing[4..]).unwrap()),
    ];

    match serialize(tensors, None) {
        Err(TensorPackError::SharedStorage(groups)) => {
            assert_eq!(groups.len(), 1);
            assert!(groups[0].contains(&"head".to_string()));
            assert!(groups[0].contains(&"tail".to_string()));
        }
        other => panic!("expected SharedStorage, got {other:?}"),
    }
}

/// Disjoint slices of one allocation occupy distinct byte ranges and are
/// fine to save.
#[test]
fn test_disjoint_slices_are_allowed() -> tensorpack::Result<()> {
    let backing = vec![0u8; 8];
    let tensors = vec![
        ("head", TensorView::new(Dtype::U8, vec![4], &backing[..4])?),
        ("tail", TensorView::new(Dtype::U8, vec![4], &backing[4..])?),
    ];

    let bytes = serialize(tensors, None)?;
    assert_eq!(TensorPack::deserialize(&bytes)?.len(), 2);
    Ok(())
}

/// A view whose slice length disagrees with dtype * shape never exists.
#[test]
fn test_invalid_view_rejection() {
    let data = [0u8; 3];
    assert!(matches!(
        TensorView::new(Dtype::F32, vec![1], &data),
        Err(TensorPackError::InvalidInput(_))
    ));
}

/// A custom View implementation that lies about its length is caught by
/// layout validation during offset assignment.
#[test]
fn test_lying_view_rejection() {
    struct LyingView;

    impl View for LyingView {
        fn dtype(&self) -> Dtype {
            Dtype::F32
        }
        fn shape(&self) -> &[usize] {
            &[4]
        }
        fn data(&self) -> Cow<'_, [u8]> {
            Cow::Owned(vec![0u8; 3])
        }
        fn data_len(&self) -> usize {
            3
        }
    }

    match serialize(vec![("liar", LyingView)], None) {
        Err(TensorPackError::ShapeMismatch { name, expected, found }) => {
            assert_eq!(name, "liar");
            assert_eq!(expected, 16);
            assert_eq!(found, 3);
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}
