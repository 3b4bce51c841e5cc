use spi_cosim::matrix::{self, DEFAULT_TOLERANCE, Matrix};
use spi_cosim::{MatrixError, f32_to_word};

fn hex_lines(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| format!("{:08X}\n", f32_to_word(*v)))
        .collect()
}

fn dump(a: &[f32], b: &[f32], c: &[f32]) -> String {
    format!(
        "M:2,K:2\n{}\nK:2,N:1\n{}\nM:2,N:1\n{}",
        hex_lines(a),
        hex_lines(b),
        hex_lines(c)
    )
}

#[test]
fn test_parse_and_verify_matching_dump() {
    let text = dump(&[1.0, 2.0, 3.0, 4.0], &[0.5, -1.0], &[-1.5, -2.5]);
    let parsed = matrix::parse_dump(&text).unwrap();
    assert_eq!(parsed.a, Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap());
    assert_eq!((parsed.b.rows, parsed.b.cols), (2, 1));

    let software = matrix::matmul(&parsed.a, &parsed.b).unwrap();
    assert_eq!(software.data, vec![-1.5, -2.5]);

    let comparison = matrix::compare(&software, &parsed.c, DEFAULT_TOLERANCE).unwrap();
    assert!(comparison.passed());
    assert!(comparison.to_string().ends_with("✅ ALL PASS"));
}

#[test]
fn test_detects_device_error() {
    let text = dump(&[1.0, 0.0, 0.0, 1.0], &[2.0, 3.0], &[2.0, 3.01]);
    let parsed = matrix::parse_dump(&text).unwrap();
    let software = matrix::matmul(&parsed.a, &parsed.b).unwrap();
    let comparison = matrix::compare(&software, &parsed.c, DEFAULT_TOLERANCE).unwrap();

    assert!(!comparison.passed());
    assert!(!comparison.elements[1].matches);
    assert!((comparison.max_difference() - 0.01).abs() < 1e-4);
    let report = comparison.to_string();
    assert!(report.contains("C[1][0] => DUT: 3.010000 | SW: 3.000000 --> ❌"));
    assert!(report.ends_with("❌ MISMATCH DETECTED"));
}

#[test]
fn test_truncated_dump() {
    let err = matrix::parse_dump("M:1,K:2\n3F800000\n").unwrap_err();
    assert!(matches!(err, MatrixError::Truncated { .. }));
}

#[test]
fn test_bad_element() {
    let err = matrix::parse_dump("M:1,K:1\nnot-hex\n").unwrap_err();
    assert_eq!(
        err,
        MatrixError::BadValue {
            line: 2,
            text: "not-hex".into()
        }
    );
}

#[test]
fn test_bad_header() {
    let err = matrix::parse_dump("M:1\n").unwrap_err();
    assert!(matches!(err, MatrixError::BadHeader { line: 1, .. }));
}

#[test]
fn test_overflowing_header_is_rejected() {
    let err = matrix::parse_dump("M:4294967296,K:4294967297\n0\n").unwrap_err();
    assert!(matches!(err, MatrixError::BadHeader { line: 1, .. }), "{err:?}");

    let err = matrix::parse_dump(&format!("M:{},K:2\n0\n", usize::MAX)).unwrap_err();
    assert!(matches!(err, MatrixError::BadHeader { line: 1, .. }), "{err:?}");
}

#[test]
fn test_huge_header_with_short_body_is_truncated() {
    let err = matrix::parse_dump("M:100000,K:100000\n3F800000\n").unwrap_err();
    assert!(matches!(err, MatrixError::Truncated { .. }), "{err:?}");
}

#[test]
fn test_shape_must_match_data() {
    assert_eq!(
        Matrix::new(2, 2, vec![1.0]).unwrap_err(),
        MatrixError::ShapeMismatch {
            rows: 2,
            cols: 2,
            len: 1
        }
    );
    assert!(Matrix::new(usize::MAX, 2, Vec::new()).is_err());
}

#[test]
fn test_operand_shapes_must_agree() {
    let a = Matrix::new(1, 2, vec![1.0, 2.0]).unwrap();
    let b = Matrix::new(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
    assert!(matches!(
        matrix::matmul(&a, &b),
        Err(MatrixError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_empty_inner_dimension_cannot_overflow_product() {
    let a = Matrix::new(usize::MAX, 0, Vec::new()).unwrap();
    let b = Matrix::new(0, 2, Vec::new()).unwrap();
    assert!(matches!(
        matrix::matmul(&a, &b),
        Err(MatrixError::DimensionMismatch { .. })
    ));
}

#[test]
fn test_display_uses_fixed_columns() {
    let m = Matrix::new(1, 2, vec![1.0, -0.25]).unwrap();
    assert_eq!(m.to_string(), "     1.000    -0.250\n");
}
