use std::fmt;

/// A convenient result type wrapping [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct TruncatedError {
    pub offset: usize,
    pub needed: usize,
    pub reading: &'static str,
}

#[derive(Debug)]
pub struct LayerOverflowError {
    pub cell: (i32, i32),
    pub quad: (usize, usize),
    pub mask: u16,
}

#[derive(Debug)]
pub struct GroupOverflowError {
    pub cell: (i32, i32),
    pub groups: usize,
}

#[derive(Debug)]
pub struct LayerCountError {
    pub cell: (i32, i32),
    pub layer_count: usize,
}

#[derive(Debug)]
pub struct EmptyVertexGroupsError {
    pub cell: (i32, i32),
    pub point: (usize, usize),
}

#[derive(Debug)]
pub struct LayerLookupError {
    pub cell: (i32, i32),
    pub layer_index: i32,
}

impl fmt::Display for TruncatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "level data truncated at offset {} while reading {} ({} bytes needed)",
            self.offset, self.reading, self.needed
        )
    }
}

impl fmt::Display for LayerOverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cell ({}, {}) quad ({}, {}) references {} layers (mask {:#06x}), at most 4 fit a channel group",
            self.cell.0,
            self.cell.1,
            self.quad.0,
            self.quad.1,
            self.mask.count_ones(),
            self.mask
        )
    }
}

impl fmt::Display for GroupOverflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cell ({}, {}) requires {} channel groups, at most 32 are addressable per cell",
            self.cell.0, self.cell.1, self.groups
        )
    }
}

impl fmt::Display for LayerCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cell ({}, {}) declares {} blend layers, at most 16 fit a layer-set mask",
            self.cell.0, self.cell.1, self.layer_count
        )
    }
}

impl fmt::Display for EmptyVertexGroupsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cell ({}, {}) grid point ({}, {}) is bordered by no quad and needs no channel group",
            self.cell.0, self.cell.1, self.point.0, self.point.1
        )
    }
}

impl fmt::Display for LayerLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cell ({}, {}) references layer {} which is missing from the landscape layer table",
            self.cell.0, self.cell.1, self.layer_index
        )
    }
}

impl std::error::Error for TruncatedError {}

impl std::error::Error for LayerOverflowError {}

impl std::error::Error for GroupOverflowError {}

impl std::error::Error for LayerCountError {}

impl std::error::Error for EmptyVertexGroupsError {}

impl std::error::Error for LayerLookupError {}

#[derive(Debug)]
pub enum Error {
    Truncated(TruncatedError),
    LayerOverflow(LayerOverflowError),
    GroupOverflow(GroupOverflowError),
    LayerCount(LayerCountError),
    EmptyVertexGroups(EmptyVertexGroupsError),
    LayerLookup(LayerLookupError),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Truncated(err) => err.fmt(f),
            Error::LayerOverflow(err) => err.fmt(f),
            Error::GroupOverflow(err) => err.fmt(f),
            Error::LayerCount(err) => err.fmt(f),
            Error::EmptyVertexGroups(err) => err.fmt(f),
            Error::LayerLookup(err) => err.fmt(f),
            Error::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Truncated(err) => Some(err),
            Error::LayerOverflow(err) => Some(err),
            Error::GroupOverflow(err) => Some(err),
            Error::LayerCount(err) => Some(err),
            Error::EmptyVertexGroups(err) => Some(err),
            Error::LayerLookup(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}
