//! TDS protocol constants.
//!
//! Values follow the MS-TDS specification (TDS 7.4).

// Packet types
pub const TDS_PACKET_TYPE_SQL_BATCH: u8 = 0x01;
pub const TDS_PACKET_TYPE_REPLY: u8 = 0x04;
pub const TDS_PACKET_TYPE_ATTENTION: u8 = 0x06;
pub const TDS_PACKET_TYPE_BULK_LOAD: u8 = 0x07;

// Packet status
pub const TDS_STATUS_NORMAL: u8 = 0x00;
pub const TDS_STATUS_EOM: u8 = 0x01;

// Packet sizes
pub const TDS_PACKET_SIZE_DEFAULT: usize = 4096;
pub const TDS_PACKET_SIZE_MIN: usize = 512;
pub const TDS_PACKET_SIZE_MAX: usize = 32767;

// Tokens
pub const TDS_TOKEN_COLMETADATA: u8 = 0x81;
pub const TDS_TOKEN_ORDER: u8 = 0xA9;
pub const TDS_TOKEN_ERROR: u8 = 0xAA;
pub const TDS_TOKEN_INFO: u8 = 0xAB;
pub const TDS_TOKEN_RETURN_STATUS: u8 = 0x79;
pub const TDS_TOKEN_LOGINACK: u8 = 0xAD;
pub const TDS_TOKEN_ROW: u8 = 0xD1;
pub const TDS_TOKEN_ENVCHANGE: u8 = 0xE3;
pub const TDS_TOKEN_DONE: u8 = 0xFD;
pub const TDS_TOKEN_DONEPROC: u8 = 0xFE;
pub const TDS_TOKEN_DONEINPROC: u8 = 0xFF;

// DONE status bits
pub const TDS_DONE_FINAL: u16 = 0x0000;
pub const TDS_DONE_MORE: u16 = 0x0001;
pub const TDS_DONE_ERROR: u16 = 0x0002;
pub const TDS_DONE_COUNT: u16 = 0x0010;
pub const TDS_DONE_ATTN: u16 = 0x0020;
pub const TDS_DONE_SRVERROR: u16 = 0x0100;

// COLMETADATA column flags
pub const TDS_COL_FLAG_NULLABLE: u16 = 0x0001;
pub const TDS_COL_FLAG_UPDATEABLE: u16 = 0x0008;
pub const TDS_COL_FLAG_IDENTITY: u16 = 0x0010;
pub const TDS_COL_FLAG_COMPUTED: u16 = 0x0020;
pub const TDS_COLMETADATA_NO_METADATA: u16 = 0xFFFF;

// Fixed-length data types
pub const TDS_TYPE_INT1: u8 = 0x30;
pub const TDS_TYPE_BIT: u8 = 0x32;
pub const TDS_TYPE_INT2: u8 = 0x34;
pub const TDS_TYPE_INT4: u8 = 0x38;
pub const TDS_TYPE_DATETIM4: u8 = 0x3A;
pub const TDS_TYPE_FLT4: u8 = 0x3B;
pub const TDS_TYPE_MONEY: u8 = 0x3C;
pub const TDS_TYPE_DATETIME: u8 = 0x3D;
pub const TDS_TYPE_FLT8: u8 = 0x3E;
pub const TDS_TYPE_MONEY4: u8 = 0x7A;
pub const TDS_TYPE_INT8: u8 = 0x7F;

// Variable-length (BYTELEN) data types
pub const TDS_TYPE_GUID: u8 = 0x24;
pub const TDS_TYPE_INTN: u8 = 0x26;
pub const TDS_TYPE_DATEN: u8 = 0x28;
pub const TDS_TYPE_TIMEN: u8 = 0x29;
pub const TDS_TYPE_DATETIME2N: u8 = 0x2A;
pub const TDS_TYPE_DATETIMEOFFSETN: u8 = 0x2B;
pub const TDS_TYPE_BITN: u8 = 0x68;
pub const TDS_TYPE_DECIMALN: u8 = 0x6A;
pub const TDS_TYPE_NUMERICN: u8 = 0x6C;
pub const TDS_TYPE_FLTN: u8 = 0x6D;
pub const TDS_TYPE_MONEYN: u8 = 0x6E;
pub const TDS_TYPE_DATETIMN: u8 = 0x6F;

// Variable-length (USHORTLEN) data types
pub const TDS_TYPE_BIGVARBINARY: u8 = 0xA5;
pub const TDS_TYPE_BIGVARCHAR: u8 = 0xA7;
pub const TDS_TYPE_BIGBINARY: u8 = 0xAD;
pub const TDS_TYPE_BIGCHAR: u8 = 0xAF;
pub const TDS_TYPE_NVARCHAR: u8 = 0xE7;
pub const TDS_TYPE_NCHAR: u8 = 0xEF;

// Document type (always PLP)
pub const TDS_TYPE_JSON: u8 = 0xF4;

// Length markers
pub const TDS_USHORT_MAX_LEN: u16 = 0xFFFF;
pub const TDS_USHORT_NULL: u16 = 0xFFFF;
pub const TDS_PLP_NULL: u64 = 0xFFFF_FFFF_FFFF_FFFF;
pub const TDS_PLP_UNKNOWN_LEN: u64 = 0xFFFF_FFFF_FFFF_FFFE;
pub const TDS_PLP_TERMINATOR: u32 = 0;
pub const TDS_PLP_CHUNK_SIZE: usize = 8000;

// ALL_HEADERS
pub const TDS_ALL_HEADERS_LEN: u32 = 22;
pub const TDS_HEADER_TRANSACTION_DESCRIPTOR: u16 = 0x0002;

// Collation
pub const TDS_COLLATION_LEN: usize = 5;
/// SQL_Latin1_General_CP1_CI_AS.
pub const TDS_COLLATION_DEFAULT: [u8; TDS_COLLATION_LEN] = [0x09, 0x04, 0xD0, 0x00, 0x34];
/// fUTF8 bit in the collation info word.
pub const TDS_COLLATION_FLAG_UTF8: u32 = 1 << 26;
