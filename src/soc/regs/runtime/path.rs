//! Dotted accessor paths such as `SYS.TABLE[3]` or `MUX[1].LOW`.

use std::fmt;

use smallvec::SmallVec;

use crate::soc::regs::{RegError, RegResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Member(&'a str),
    Index(usize),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterPath<'a> {
    segments: SmallVec<[PathSegment<'a>; 8]>,
}

impl<'a> RegisterPath<'a> {
    pub fn parse(text: &'a str) -> RegResult<Self> {
        let bad = || RegError::BadPath {
            path: text.to_string(),
        };
        let mut segments = SmallVec::new();
        for part in text.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(open) => part.split_at(open),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(bad());
            }
            segments.push(PathSegment::Member(name));
            while !rest.is_empty() {
                let Some((index, tail)) = rest
                    .strip_prefix('[')
                    .and_then(|inner| inner.split_once(']'))
                else {
                    return Err(bad());
                };
                let index = index.trim().parse::<usize>().map_err(|_| bad())?;
                segments.push(PathSegment::Index(index));
                rest = tail;
            }
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment<'a>] {
        &self.segments
    }
}

impl fmt::Display for RegisterPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Member(name) => {
                    if position > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
