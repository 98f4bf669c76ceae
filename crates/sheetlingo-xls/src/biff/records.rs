//! BIFF8 record identifiers used by the reader

// Stream structure
pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;

// Workbook globals
pub const BOUNDSHEET: u16 = 0x0085;
pub const SST: u16 = 0x00FC;
pub const FONT: u16 = 0x0031;
pub const FORMAT: u16 = 0x041E;
pub const XF: u16 = 0x00E0;
pub const PALETTE: u16 = 0x0092;

// Cells
pub const DIMENSIONS: u16 = 0x0200;
pub const LABELSST: u16 = 0x00FD;
pub const LABEL: u16 = 0x0204;
pub const NUMBER: u16 = 0x0203;
pub const RK: u16 = 0x027E;
pub const MULRK: u16 = 0x00BD;
pub const BLANK: u16 = 0x0201;
pub const MULBLANK: u16 = 0x00BE;
pub const BOOLERR: u16 = 0x0205;
pub const FORMULA: u16 = 0x0006;
/// Cached string result of the FORMULA just before it
pub const STRING: u16 = 0x0207;

// Sheet structure
pub const ROW: u16 = 0x0208;
pub const COLINFO: u16 = 0x007D;
pub const DEFCOLWIDTH: u16 = 0x0055;
pub const DEFAULTROWHEIGHT: u16 = 0x0225;
pub const MERGECELLS: u16 = 0x00E5;

// BOF substream types
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;

pub const BIFF8_VERSION: u16 = 0x0600;

/// BOUNDSHEET sheet type of an ordinary worksheet
pub const SHEET_TYPE_WORKSHEET: u8 = 0x00;

/// XF index Excel gives cells with no explicit format
pub const DEFAULT_CELL_XF: u16 = 15;
