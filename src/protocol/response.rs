//! Token stream parsing for server replies.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::*;
use crate::protocol::types::ColumnMetadata;

/// ENVCHANGE type carrying the negotiated packet size.
const ENV_PACKET_SIZE: u8 = 4;

/// An ERROR or INFO token.
#[derive(Debug, Clone, Default)]
pub struct ServerMessage {
    /// Message number.
    pub number: i32,
    /// Error state.
    pub state: u8,
    /// Severity class.
    pub class: u8,
    /// Message text.
    pub message: String,
    /// Server name.
    pub server: String,
    /// Procedure name, empty for batches.
    pub procedure: String,
    /// Line number in the batch or procedure.
    pub line: u32,
}

impl From<ServerMessage> for Error {
    fn from(msg: ServerMessage) -> Self {
        Error::Server {
            number: msg.number,
            state: msg.state,
            class: msg.class,
            message: msg.message,
        }
    }
}

/// A DONE, DONEPROC or DONEINPROC token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Done {
    pub status: u16,
    pub cur_cmd: u16,
    pub row_count: u64,
}

impl Done {
    /// Whether the row count is valid.
    pub fn has_count(&self) -> bool {
        self.status & TDS_DONE_COUNT != 0
    }

    /// Whether the statement ended in error.
    pub fn is_error(&self) -> bool {
        self.status & (TDS_DONE_ERROR | TDS_DONE_SRVERROR) != 0
    }

    /// Whether more results follow.
    pub fn has_more(&self) -> bool {
        self.status & TDS_DONE_MORE != 0
    }
}

/// Parsed reply message.
#[derive(Debug, Default)]
pub struct Response {
    /// Column metadata from the last COLMETADATA token.
    pub columns: Vec<ColumnMetadata>,
    /// ERROR tokens.
    pub errors: Vec<ServerMessage>,
    /// INFO tokens.
    pub infos: Vec<ServerMessage>,
    /// DONE tokens in arrival order.
    pub done: Vec<Done>,
    /// RETURN_STATUS value, if any.
    pub return_status: Option<i32>,
    /// Packet size announced through ENVCHANGE.
    pub packet_size: Option<usize>,
}

impl Response {
    /// Sum of the row counts of all counted DONE tokens.
    pub fn rows_affected(&self) -> u64 {
        self.done
            .iter()
            .filter(|d| d.has_count())
            .map(|d| d.row_count)
            .sum()
    }

    /// Turn the first ERROR token into `Error::Server`.
    ///
    /// A DONE token with the error bit but no ERROR token is a protocol error.
    pub fn into_result(mut self) -> Result<Self> {
        if !self.errors.is_empty() {
            return Err(self.errors.swap_remove(0).into());
        }
        if self.done.iter().any(|d| d.is_error()) {
            return Err(Error::protocol("Server reported an error without an ERROR token"));
        }
        Ok(self)
    }
}

/// Parse a complete reply message.
pub fn parse_response(data: Bytes) -> Result<Response> {
    let mut buf = ReadBuffer::new(data);
    let mut response = Response::default();

    while buf.remaining() > 0 {
        let token = buf.read_u8()?;
        trace!(token, remaining = buf.remaining(), "token");

        match token {
            TDS_TOKEN_COLMETADATA => {
                response.columns = parse_colmetadata(&mut buf)?;
            }
            TDS_TOKEN_ERROR => {
                let msg = parse_server_message(&mut buf)?;
                debug!(number = msg.number, class = msg.class, message = %msg.message, "server error");
                response.errors.push(msg);
            }
            TDS_TOKEN_INFO => {
                let msg = parse_server_message(&mut buf)?;
                debug!(number = msg.number, message = %msg.message, "server info");
                response.infos.push(msg);
            }
            TDS_TOKEN_ENVCHANGE => {
                if let Some(size) = parse_env_change(&mut buf)? {
                    response.packet_size = Some(size);
                }
            }
            TDS_TOKEN_ORDER | TDS_TOKEN_LOGINACK => {
                let len = buf.read_u16_le()? as usize;
                buf.skip(len)?;
            }
            TDS_TOKEN_RETURN_STATUS => {
                response.return_status = Some(buf.read_i32_le()?);
            }
            TDS_TOKEN_DONE | TDS_TOKEN_DONEPROC | TDS_TOKEN_DONEINPROC => {
                response.done.push(Done {
                    status: buf.read_u16_le()?,
                    cur_cmd: buf.read_u16_le()?,
                    row_count: buf.read_u64_le()?,
                });
            }
            TDS_TOKEN_ROW => {
                return Err(Error::protocol("Unexpected ROW token in reply"));
            }
            _ => {
                return Err(Error::protocol(format!(
                    "Unexpected token 0x{:02X} at offset {}",
                    token,
                    buf.position() - 1
                )));
            }
        }
    }

    Ok(response)
}

/// Parse the body of a COLMETADATA token (token byte already consumed).
pub fn parse_colmetadata(buf: &mut ReadBuffer) -> Result<Vec<ColumnMetadata>> {
    let count = buf.read_u16_le()?;
    if count == TDS_COLMETADATA_NO_METADATA {
        return Ok(Vec::new());
    }

    let mut columns = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let _user_type = buf.read_u32_le()?;
        let flags = buf.read_u16_le()?;
        let tds_type = buf.read_u8()?;

        let mut column = ColumnMetadata::new(String::new(), tds_type);
        column.flags = flags;
        parse_type_info(buf, &mut column)?;
        column.name = buf.read_b_varchar()?;
        columns.push(column);
    }
    Ok(columns)
}

fn parse_type_info(buf: &mut ReadBuffer, column: &mut ColumnMetadata) -> Result<()> {
    match column.tds_type {
        TDS_TYPE_INT1 | TDS_TYPE_BIT => column.max_len = 1,
        TDS_TYPE_INT2 => column.max_len = 2,
        TDS_TYPE_INT4 | TDS_TYPE_DATETIM4 | TDS_TYPE_FLT4 | TDS_TYPE_MONEY4 => column.max_len = 4,
        TDS_TYPE_INT8 | TDS_TYPE_DATETIME | TDS_TYPE_FLT8 | TDS_TYPE_MONEY => column.max_len = 8,
        TDS_TYPE_GUID | TDS_TYPE_INTN | TDS_TYPE_BITN | TDS_TYPE_FLTN | TDS_TYPE_MONEYN
        | TDS_TYPE_DATETIMN => {
            column.max_len = buf.read_u8()? as u32;
        }
        TDS_TYPE_DECIMALN | TDS_TYPE_NUMERICN => {
            column.max_len = buf.read_u8()? as u32;
            column.precision = buf.read_u8()?;
            column.scale = buf.read_u8()?;
        }
        TDS_TYPE_DATEN => column.max_len = 3,
        TDS_TYPE_TIMEN | TDS_TYPE_DATETIME2N | TDS_TYPE_DATETIMEOFFSETN => {
            column.scale = buf.read_u8()?;
        }
        TDS_TYPE_BIGVARBINARY | TDS_TYPE_BIGBINARY => {
            column.max_len = buf.read_u16_le()? as u32;
        }
        TDS_TYPE_BIGVARCHAR | TDS_TYPE_BIGCHAR | TDS_TYPE_NVARCHAR | TDS_TYPE_NCHAR => {
            column.max_len = buf.read_u16_le()? as u32;
            let bytes = buf.read_bytes(TDS_COLLATION_LEN)?;
            let mut collation = [0u8; TDS_COLLATION_LEN];
            collation.copy_from_slice(&bytes);
            column.collation = Some(collation);
        }
        TDS_TYPE_JSON => column.max_len = TDS_USHORT_MAX_LEN as u32,
        other => {
            return Err(Error::UnsupportedType {
                type_code: other as i32,
            })
        }
    }
    Ok(())
}

fn parse_server_message(buf: &mut ReadBuffer) -> Result<ServerMessage> {
    let _len = buf.read_u16_le()?;
    Ok(ServerMessage {
        number: buf.read_i32_le()?,
        state: buf.read_u8()?,
        class: buf.read_u8()?,
        message: buf.read_us_varchar()?,
        server: buf.read_b_varchar()?,
        procedure: buf.read_b_varchar()?,
        line: buf.read_u32_le()?,
    })
}

/// Parse an ENVCHANGE token, returning the new packet size when announced.
fn parse_env_change(buf: &mut ReadBuffer) -> Result<Option<usize>> {
    let len = buf.read_u16_le()? as usize;
    let mut body = ReadBuffer::new(buf.read_bytes(len)?);
    if len == 0 || body.read_u8()? != ENV_PACKET_SIZE {
        return Ok(None);
    }
    let new_value = body.read_b_varchar()?;
    new_value
        .parse::<usize>()
        .map(Some)
        .map_err(|_| Error::protocol(format!("Invalid packet size '{}'", new_value)))
}
