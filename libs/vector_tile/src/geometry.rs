//! Geometry types and the interpreter for the MVT command stream.

use serde::{ser::SerializeTuple, Serialize, Serializer};

use crate::{error::GeometryError, protobuf::zigzag_decode};

type Number = i64;

const CMD_MOVE_TO: u32 = 1;
const CMD_LINE_TO: u32 = 2;
const CMD_CLOSE_PATH: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeomType {
    Unknown,
    Point,
    LineString,
    Polygon,
}

impl From<u64> for GeomType {
    fn from(value: u64) -> Self {
        match value {
            1 => GeomType::Point,
            2 => GeomType::LineString,
            3 => GeomType::Polygon,
            _ => GeomType::Unknown,
        }
    }
}

/// A position in tile-local units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: Number,
    pub y: Number,
}

impl Point {
    pub fn new(x: Number, y: Number) -> Self {
        Self { x, y }
    }
}

impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.x)?;
        tuple.serialize_element(&self.y)?;
        tuple.end()
    }
}

pub type LineString = Vec<Point>;

/// A ring without the closing duplicate of its first point.
pub type Ring = Vec<Point>;

/// The exterior ring followed by its interior rings.
pub type Polygon = Vec<Ring>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Point),
    MultiPoint(Vec<Point>),
    LineString(LineString),
    MultiLineString(Vec<LineString>),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

enum Command {
    MoveTo(u32),
    LineTo(u32),
    ClosePath(u32),
}

/// Walks a command stream while tracking the cursor.
struct CommandReader<'a> {
    stream: &'a [u32],
    pos: usize,
    cursor: Point,
}

impl<'a> CommandReader<'a> {
    fn new(stream: &'a [u32]) -> Self {
        Self {
            stream,
            pos: 0,
            cursor: Point::new(0, 0),
        }
    }

    fn next_command(&mut self) -> Option<Result<Command, GeometryError>> {
        let value = *self.stream.get(self.pos)?;
        self.pos += 1;

        let count = value >> 3;
        Some(match value & 0x7 {
            CMD_MOVE_TO => Ok(Command::MoveTo(count)),
            CMD_LINE_TO => Ok(Command::LineTo(count)),
            CMD_CLOSE_PATH => Ok(Command::ClosePath(count)),
            id => Err(GeometryError::UnknownCommand(id)),
        })
    }

    fn next_point(&mut self) -> Result<Point, GeometryError> {
        let (dx, dy) = match self.stream.get(self.pos..self.pos + 2) {
            Some(&[dx, dy]) => (dx, dy),
            _ => return Err(GeometryError::TruncatedParameters),
        };
        self.pos += 2;

        self.cursor.x += zigzag_decode(u64::from(dx));
        self.cursor.y += zigzag_decode(u64::from(dy));
        Ok(self.cursor)
    }
}

/// Twice the signed area of a ring (shoelace formula). In tile coordinates, where y points
/// down, exterior rings are positive and interior rings negative.
pub fn signed_area(ring: &[Point]) -> i128 {
    let Some(last) = ring.last() else {
        return 0;
    };

    let mut previous = last;
    let mut sum = 0i128;
    for point in ring {
        sum += i128::from(previous.x) * i128::from(point.y)
            - i128::from(point.x) * i128::from(previous.y);
        previous = point;
    }
    sum
}

/// Interprets the command stream of a feature according to its geometry type.
pub fn decode_geometry(geom_type: GeomType, stream: &[u32]) -> Result<Geometry, GeometryError> {
    let mut reader = CommandReader::new(stream);
    match geom_type {
        GeomType::Point => decode_point(&mut reader),
        GeomType::LineString => decode_line_string(&mut reader),
        GeomType::Polygon => decode_polygon(&mut reader),
        GeomType::Unknown => Err(GeometryError::UnknownGeometryType),
    }
}

fn decode_point(reader: &mut CommandReader) -> Result<Geometry, GeometryError> {
    let mut points = Vec::new();
    let mut moved = false;

    while let Some(command) = reader.next_command() {
        match command? {
            Command::MoveTo(_) if moved => return Err(GeometryError::RepeatedMoveToInPoint),
            Command::MoveTo(count) => {
                moved = true;
                for _ in 0..count {
                    points.push(reader.next_point()?);
                }
            }
            Command::LineTo(_) => return Err(GeometryError::LineToInPoint),
            Command::ClosePath(_) => return Err(GeometryError::ClosePathOutsidePolygon),
        }
    }

    match points.len() {
        0 => Err(GeometryError::Empty),
        1 => Ok(Geometry::Point(points[0])),
        _ => Ok(Geometry::MultiPoint(points)),
    }
}

fn decode_line_string(reader: &mut CommandReader) -> Result<Geometry, GeometryError> {
    let mut lines: Vec<LineString> = Vec::new();

    while let Some(command) = reader.next_command() {
        match command? {
            Command::MoveTo(1) => lines.push(vec![reader.next_point()?]),
            Command::MoveTo(count) => return Err(GeometryError::InvalidMoveToCount(count)),
            Command::LineTo(count) => {
                let line = lines
                    .last_mut()
                    .ok_or(GeometryError::LineToBeforeMoveTo)?;
                for _ in 0..count {
                    line.push(reader.next_point()?);
                }
            }
            Command::ClosePath(_) => return Err(GeometryError::ClosePathOutsidePolygon),
        }
    }

    match lines.len() {
        0 => Err(GeometryError::Empty),
        1 => Ok(Geometry::LineString(lines.remove(0))),
        _ => Ok(Geometry::MultiLineString(lines)),
    }
}

fn decode_polygon(reader: &mut CommandReader) -> Result<Geometry, GeometryError> {
    let mut polygons: Vec<Polygon> = Vec::new();
    let mut ring: Option<Ring> = None;

    while let Some(command) = reader.next_command() {
        match command? {
            Command::MoveTo(1) => {
                if ring.is_some() {
                    return Err(GeometryError::UnclosedRing);
                }
                ring = Some(vec![reader.next_point()?]);
            }
            Command::MoveTo(count) => return Err(GeometryError::InvalidMoveToCount(count)),
            Command::LineTo(count) => {
                let ring = ring.as_mut().ok_or(GeometryError::LineToBeforeMoveTo)?;
                for _ in 0..count {
                    ring.push(reader.next_point()?);
                }
            }
            Command::ClosePath(1) => {
                let ring = ring.take().ok_or(GeometryError::ClosePathWithoutRing)?;
                push_ring(&mut polygons, ring)?;
            }
            Command::ClosePath(count) => {
                return Err(GeometryError::InvalidClosePathCount(count))
            }
        }
    }

    if ring.is_some() {
        return Err(GeometryError::UnclosedRing);
    }

    match polygons.len() {
        0 => Err(GeometryError::Empty),
        1 => Ok(Geometry::Polygon(polygons.remove(0))),
        _ => Ok(Geometry::MultiPolygon(polygons)),
    }
}

fn push_ring(polygons: &mut Vec<Polygon>, ring: Ring) -> Result<(), GeometryError> {
    let area = signed_area(&ring);
    if area > 0 {
        polygons.push(vec![ring]);
    } else if area < 0 {
        polygons
            .last_mut()
            .ok_or(GeometryError::InteriorRingFirst)?
            .push(ring);
    } else {
        log::debug!("dropping degenerate ring with {} points", ring.len());
    }
    Ok(())
}
