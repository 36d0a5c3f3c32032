//! Parser for the path-command mini-language (`M 0 0 L 10 0 C ... Z`).
//!
//! Produces a flat list of [`PathCommand`]s with coordinates exactly as
//! written; resolving relative coordinates and smooth-curve reflections is
//! the flattener's job because both depend on the running pen state.

use glam::DVec2;
use thiserror::Error;

/// One drawing command. `relative` commands are offsets from the current point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { to: DVec2, relative: bool },
    LineTo { to: DVec2, relative: bool },
    HorizontalTo { x: f64, relative: bool },
    VerticalTo { y: f64, relative: bool },
    QuadraticTo { ctrl: DVec2, to: DVec2, relative: bool },
    SmoothQuadraticTo { to: DVec2, relative: bool },
    CubicTo { ctrl1: DVec2, ctrl2: DVec2, to: DVec2, relative: bool },
    SmoothCubicTo { ctrl2: DVec2, to: DVec2, relative: bool },
    ArcTo {
        radii: DVec2,
        /// Rotation of the ellipse x-axis, in degrees.
        x_rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: DVec2,
        relative: bool,
    },
    Close,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("command '{command}' is missing a numeric argument at offset {offset}")]
    MissingArgument { command: char, offset: usize },

    #[error("invalid arc flag at offset {offset}")]
    InvalidFlag { offset: usize },

    #[error("path must start with a move command, found '{command}'")]
    MissingMoveTo { command: char },
}

/// Parse a path-command string.
pub fn parse_path(data: &str) -> Result<Vec<PathCommand>, PathError> {
    let mut cursor = Cursor::new(data);
    let mut commands = Vec::new();
    let mut current: Option<char> = None;

    loop {
        cursor.skip_separators();
        let Some(ch) = cursor.peek() else { break };

        let command = if ch.is_ascii_alphabetic() {
            cursor.bump();
            ch
        } else if let Some(prev) = current {
            // Implicit repetition of the previous command. A repeated move
            // continues as a line.
            match prev {
                'M' => 'L',
                'm' => 'l',
                'Z' | 'z' => return Err(PathError::UnexpectedChar { ch, offset: cursor.pos }),
                other => other,
            }
        } else {
            return Err(PathError::UnexpectedChar { ch, offset: cursor.pos });
        };

        if commands.is_empty() && !matches!(command, 'M' | 'm') {
            return Err(PathError::MissingMoveTo { command });
        }

        let relative = command.is_ascii_lowercase();
        let parsed = match command.to_ascii_uppercase() {
            'M' => PathCommand::MoveTo { to: cursor.point(command)?, relative },
            'L' => PathCommand::LineTo { to: cursor.point(command)?, relative },
            'H' => PathCommand::HorizontalTo { x: cursor.number(command)?, relative },
            'V' => PathCommand::VerticalTo { y: cursor.number(command)?, relative },
            'Q' => PathCommand::QuadraticTo {
                ctrl: cursor.point(command)?,
                to: cursor.point(command)?,
                relative,
            },
            'T' => PathCommand::SmoothQuadraticTo { to: cursor.point(command)?, relative },
            'C' => PathCommand::CubicTo {
                ctrl1: cursor.point(command)?,
                ctrl2: cursor.point(command)?,
                to: cursor.point(command)?,
                relative,
            },
            'S' => PathCommand::SmoothCubicTo {
                ctrl2: cursor.point(command)?,
                to: cursor.point(command)?,
                relative,
            },
            'A' => {
                let rx = cursor.number(command)?;
                let ry = cursor.number(command)?;
                let x_rotation = cursor.number(command)?;
                let large_arc = cursor.flag()?;
                let sweep = cursor.flag()?;
                let to = cursor.point(command)?;
                PathCommand::ArcTo {
                    radii: DVec2::new(rx, ry),
                    x_rotation,
                    large_arc,
                    sweep,
                    to,
                    relative,
                }
            }
            'Z' => PathCommand::Close,
            _ => {
                return Err(PathError::UnexpectedChar {
                    ch: command,
                    offset: cursor.pos.saturating_sub(1),
                })
            }
        };
        commands.push(parsed);
        current = Some(command);
    }

    Ok(commands)
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a str) -> Self {
        Self { bytes: data.as_bytes(), pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.bytes.get(self.pos).map(|&b| b as char)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_separators(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_whitespace() || ch == ',' {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn point(&mut self, command: char) -> Result<DVec2, PathError> {
        let x = self.number(command)?;
        let y = self.number(command)?;
        Ok(DVec2::new(x, y))
    }

    /// Read one number: `[+-]digits[.digits][(e|E)[+-]digits]`, with either
    /// side of the decimal point optional.
    fn number(&mut self, command: char) -> Result<f64, PathError> {
        self.skip_separators();
        let start = self.pos;
        let missing = PathError::MissingArgument { command, offset: start };

        if matches!(self.peek(), Some('+' | '-')) {
            self.bump();
        }
        let int_digits = self.digits();
        let mut frac_digits = 0;
        if self.peek() == Some('.') {
            self.bump();
            frac_digits = self.digits();
        }
        if int_digits + frac_digits == 0 {
            self.pos = start;
            return Err(missing);
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mark = self.pos;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if self.digits() == 0 {
                // Not an exponent after all.
                self.pos = mark;
            }
        }

        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()
            .and_then(|text| text.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .ok_or(missing)
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        self.pos - start
    }

    /// Arc flags are a single `0` or `1`, possibly packed without separators.
    fn flag(&mut self) -> Result<bool, PathError> {
        self.skip_separators();
        let offset = self.pos;
        let value = match self.peek() {
            Some('0') => false,
            Some('1') => true,
            _ => return Err(PathError::InvalidFlag { offset }),
        };
        self.bump();
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_commands() {
        let cmds = parse_path("M 0 0 L 10 0 H 20 V 5 Z").unwrap();
        assert_eq!(
            cmds,
            vec![
                PathCommand::MoveTo { to: DVec2::new(0.0, 0.0), relative: false },
                PathCommand::LineTo { to: DVec2::new(10.0, 0.0), relative: false },
                PathCommand::HorizontalTo { x: 20.0, relative: false },
                PathCommand::VerticalTo { y: 5.0, relative: false },
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn implicit_lines_after_move() {
        let cmds = parse_path("m1,2 3,4 5,6").unwrap();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[1], PathCommand::LineTo { to: DVec2::new(3.0, 4.0), relative: true });
        assert_eq!(cmds[2], PathCommand::LineTo { to: DVec2::new(5.0, 6.0), relative: true });
    }

    #[test]
    fn compact_numbers() {
        let cmds = parse_path("M-1.5.5L1e2-3").unwrap();
        assert_eq!(cmds[0], PathCommand::MoveTo { to: DVec2::new(-1.5, 0.5), relative: false });
        assert_eq!(cmds[1], PathCommand::LineTo { to: DVec2::new(100.0, -3.0), relative: false });
    }

    #[test]
    fn packed_arc_flags() {
        let cmds = parse_path("M0 0 a5 5 0 1110 0").unwrap();
        assert_eq!(
            cmds[1],
            PathCommand::ArcTo {
                radii: DVec2::new(5.0, 5.0),
                x_rotation: 0.0,
                large_arc: true,
                sweep: true,
                to: DVec2::new(10.0, 0.0),
                relative: true,
            }
        );
    }

    #[test]
    fn curves_and_smooth_curves() {
        let cmds = parse_path("M0 0 C 1 1 2 2 3 3 S 5 5 6 6 Q 7 7 8 8 T 9 9").unwrap();
        assert!(matches!(cmds[1], PathCommand::CubicTo { .. }));
        assert!(matches!(cmds[2], PathCommand::SmoothCubicTo { .. }));
        assert!(matches!(cmds[3], PathCommand::QuadraticTo { .. }));
        assert!(matches!(cmds[4], PathCommand::SmoothQuadraticTo { .. }));
    }

    #[test]
    fn errors() {
        assert_eq!(
            parse_path("L 1 1"),
            Err(PathError::MissingMoveTo { command: 'L' })
        );
        assert!(matches!(
            parse_path("M 0 0 L 1"),
            Err(PathError::MissingArgument { command: 'L', .. })
        ));
        assert!(matches!(
            parse_path("M 0 0 A 1 1 0 2 0 3 3"),
            Err(PathError::InvalidFlag { .. })
        ));
        assert!(matches!(
            parse_path("M 0 0 X 1 1"),
            Err(PathError::UnexpectedChar { ch: 'X', .. })
        ));
    }

    #[test]
    fn empty_path_is_empty() {
        assert_eq!(parse_path("   ").unwrap(), Vec::new());
    }
}
