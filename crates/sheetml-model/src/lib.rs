//! `sheetml-model` is the in-memory document model for SpreadsheetML workbooks.
//!
//! The model owns every piece of workbook state directly; the package layer
//! (`sheetml-xlsx`) regenerates the markup parts from it on save and rebuilds
//! it from parts on load. Style and string tables are append-only so indices
//! held by cells stay valid for the lifetime of a [`Workbook`].

mod address;
mod cell;
mod comments;
mod error;
pub mod eval;
mod header_footer;
mod hyperlinks;
mod media;
mod merge;
mod names;
mod number_format;
mod outline;
mod print_settings;
pub mod rich_text;
mod row;
mod shared_strings;
mod style;
pub mod table;
mod theme;
mod value;
mod view;
mod workbook;
mod worksheet;

pub use address::{
    column_index_from_name, column_name, A1ParseError, CellRef, Range, RangeIter, RangeParseError,
    SheetArea,
};
pub use cell::{Cell, CellError, CellType, EXCEL_MAX_COLS, EXCEL_MAX_ROWS};
pub use comments::Comment;
pub use error::{ErrorValue, UnknownErrorLiteral};
pub use eval::{Evaluation, FormulaEvaluator};
pub use header_footer::{strip_fields, HeaderFooter, HeaderFooterSettings};
pub use hyperlinks::{Hyperlink, HyperlinkTarget};
pub use media::{MediaStore, PictureData, PictureFormat};
pub use merge::MergedRegions;
pub use names::{
    validate_defined_name, DefinedName, DefinedNameError, DefinedNameId, DefinedNameScope,
    DefinedNameValidationError, EXCEL_DEFINED_NAME_MAX_LEN, XLNM_FILTER_DATABASE, XLNM_PRINT_AREA,
    XLNM_PRINT_TITLES,
};
pub use number_format::{
    builtin_format_code, builtin_format_id, NumberFormatTable, BUILTIN_FORMATS,
    FIRST_CUSTOM_NUM_FMT_ID,
};
pub use outline::{OutlinePr, MAX_OUTLINE_LEVEL};
pub use print_settings::{Orientation, PageMargins, PageSetup, PaperSize, PrintOptions};
pub use rich_text::{RichTextRun, RichTextRunStyle, Underline};
pub use row::{Row, RowError, TWIPS_PER_POINT, UNSET_HEIGHT};
pub use shared_strings::SharedStringTable;
pub use style::{
    Alignment, Border, BorderEdge, BorderStyle, CellProtection, Color, ColorKind, Fill,
    FillPattern, Font, HorizontalAlignment, StyleError, StyleRecord, StyleRegistry,
    VerticalAlignment,
};
pub use table::{validate_table_name, Table, TableColumn, TableError, TableStyleInfo};
pub use theme::{
    indexed_color_argb, ArgbColor, IndexedPalette, ThemeColorSlot, ThemePalette,
    AUTOMATIC_COLOR_INDEX, DEFAULT_INDEXED_PALETTE,
};
pub use value::{CellValue, RichText, StringValue};
pub use view::{Pane, PanePosition, SheetView, MAX_ZOOM, MIN_ZOOM};
pub use workbook::{
    validate_sheet_name, ReferenceError, ResolvedArea, SheetNameError, Workbook, WorkbookError,
    MAX_SHEET_NAME_LEN,
};
pub use worksheet::{
    CellHandle, ColumnProps, RowHandle, SheetError, SheetVisibility, Worksheet, WorksheetId,
    DEFAULT_COLUMN_WIDTH, DEFAULT_ROW_HEIGHT_POINTS,
};
