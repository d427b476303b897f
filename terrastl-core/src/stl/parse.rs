/// STL reader for binary and ASCII formats
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending, space0},
    combinator::{all_consuming, map, opt},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, terminated, tuple},
    IResult,
};

use super::export::{FACET_LEN, HEADER_LEN, PREAMBLE_LEN};
use crate::error::{Error, Result};
use crate::geometry::{Facet, Solid};

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Solid> {
    if data.len() < PREAMBLE_LEN {
        return Err(Error::Parse(format!(
            "file too small to be a binary STL ({} bytes)",
            data.len()
        )));
    }

    let (body, triangle_count) = binary_preamble(data)
        .map_err(|e| Error::Parse(format!("bad binary header: {:?}", e)))?;

    let triangle_count = triangle_count as usize;
    let available = body.len() / FACET_LEN;
    if available < triangle_count {
        return Err(Error::Parse(format!(
            "header declares {} triangles but only {} are present",
            triangle_count, available
        )));
    }

    let (_, facets) = count(binary_facet, triangle_count)(body)
        .map_err(|e| Error::Parse(format!("bad binary facet: {:?}", e)))?;

    Ok(Solid { name: None, facets })
}

fn binary_preamble(input: &[u8]) -> IResult<&[u8], u32> {
    preceded(take(HEADER_LEN), le_u32)(input)
}

fn binary_vector(input: &[u8]) -> IResult<&[u8], (f32, f32, f32)> {
    tuple((le_f32, le_f32, le_f32))(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Facet> {
    let (input, normal) = binary_vector(input)?;
    let (input, a) = binary_vector(input)?;
    let (input, b) = binary_vector(input)?;
    let (input, c) = binary_vector(input)?;
    // Skip attribute byte count
    let (input, _) = le_u16(input)?;

    Ok((input, facet(normal, [a, b, c])))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Solid> {
    match all_consuming(terminated(ascii_solid, multispace0))(input) {
        Ok((_, solid)) => Ok(solid),
        Err(e) => Err(Error::Parse(format!("invalid ASCII STL: {:?}", e))),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Solid> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, name) = solid_name(input)?;
    let (input, facets) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = solid_name(input)?;

    Ok((input, Solid { name, facets }))
}

/// Optional name running to the end of the line
fn solid_name(input: &str) -> IResult<&str, Option<String>> {
    map(opt(preceded(space0, not_line_ending)), |name: Option<&str>| {
        name.map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    })(input)
}

fn ascii_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vector(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, facet(normal, [a, b, c])))
}

fn ascii_vertex(input: &str) -> IResult<&str, (f32, f32, f32)> {
    preceded(preceded(multispace0, tag("vertex")), ascii_vector)(input)
}

fn ascii_vector(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

fn facet(normal: (f32, f32, f32), vertices: [(f32, f32, f32); 3]) -> Facet {
    Facet {
        normal: Vector3::new(normal.0, normal.1, normal.2),
        vertices: vertices.map(|(x, y, z)| Point3::new(x, y, z)),
    }
}

/// Detect and parse STL data (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Solid> {
    // Binary headers may also start with "solid", so fall back on failure
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(solid) = parse_ascii_stl(text) {
                return Ok(solid);
            }
        }
    }

    parse_binary_stl(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let solid = parse_binary_stl(&data).unwrap();
        assert!(solid.is_empty());
    }

    #[test]
    fn test_binary_too_small() {
        assert!(matches!(parse_binary_stl(&[0u8; 40]), Err(Error::Parse(_))));
    }

    #[test]
    fn test_binary_truncated_facets() {
        let mut data = vec![0u8; 84 + 50];
        data[80..84].copy_from_slice(&2u32.to_le_bytes());

        let err = parse_binary_stl(&data).unwrap_err();
        assert!(err.to_string().contains("declares 2 triangles"));
    }

    #[test]
    fn test_parse_ascii_with_names() {
        let text = "solid terrain\n\
                    facet normal 0 0 1\n\
                    outer loop\n\
                    vertex 0 0 0\n\
                    vertex 1 0 0\n\
                    vertex 0 1.5 -2.25\n\
                    endloop\n\
                    endfacet\n\
                    endsolid terrain\n";

        let solid = parse_ascii_stl(text).unwrap();
        assert_eq!(solid.name.as_deref(), Some("terrain"));
        assert_eq!(solid.len(), 1);
        assert_eq!(solid.facets[0].normal, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(solid.facets[0].vertices[2], Point3::new(0.0, 1.5, -2.25));
    }

    #[test]
    fn test_parse_ascii_empty_unnamed() {
        let solid = parse_ascii_stl("solid\nendsolid\n").unwrap();
        assert_eq!(solid.name, None);
        assert!(solid.is_empty());
    }

    #[test]
    fn test_parse_ascii_rejects_trailing_garbage() {
        assert!(parse_ascii_stl("solid a\nendsolid a\nfacet").is_err());
    }

    #[test]
    fn test_detects_binary_with_solid_header() {
        let mut data = vec![0u8; 84];
        data[..5].copy_from_slice(b"solid");
        let solid = parse_stl(&data).unwrap();
        assert!(solid.is_empty());
    }
}
