/// Container writer: GRF v2 framing, header actions and file output.

use std::io::{self, Write};
use std::path::Path;

use crate::core::compiler::CompileError;
use crate::core::emit::{
    write_block, write_lang_string, write_raw_string, write_u16, write_u32, write_u8, Payload,
};
use crate::schema::language::Language;
use crate::schema::metadata::GrfMetadata;

/// Fixed preamble of a container version 2 file.
pub const MAGIC: [u8; 10] = [0x00, 0x00, b'G', b'R', b'F', 0x82, 0x0D, 0x0A, 0x1A, 0x0A];
pub const NO_COMPRESSION: u8 = 0;
/// NewGRF format version declared in Action 8.
pub const GRF_VERSION: u8 = 8;

pub const ACTION_INFO: u8 = 0x14;
pub const ACTION_GRF_ID: u8 = 0x08;

/// Byte offset of the first block in a container.
pub const HEADER_LEN: usize = MAGIC.len() + 4 + 1;

/// Action 14 static information: translated strings, version numbers and
/// the fixed compatibility fields.
pub fn info_block(meta: &GrfMetadata) -> Result<Vec<u8>, CompileError> {
    let mut out = Vec::new();
    write_u8(&mut out, ACTION_INFO);

    out.extend_from_slice(b"CINFO");
    for (lang, text) in meta.translated_descriptions() {
        out.extend_from_slice(b"TDESC");
        write_lang_string(&mut out, lang, text)?;
    }
    for (lang, text) in meta.translated_names() {
        out.extend_from_slice(b"TNAME");
        write_lang_string(&mut out, lang, text)?;
    }
    out.extend_from_slice(b"TURL_");
    write_lang_string(&mut out, Language::ANY, &meta.url)?;

    out.extend_from_slice(b"BVRSN");
    write_u16(&mut out, 4);
    write_u32(&mut out, meta.version);
    out.extend_from_slice(b"BMINV");
    write_u16(&mut out, 4);
    write_u32(&mut out, meta.min_version);

    // no parameters, any palette, 8bpp blitter
    out.extend_from_slice(b"BNPAR");
    write_u16(&mut out, 1);
    write_u8(&mut out, 0);
    out.extend_from_slice(b"BPALS");
    write_u16(&mut out, 1);
    write_u8(&mut out, b'A');
    out.extend_from_slice(b"BBLTR");
    write_u16(&mut out, 1);
    write_u8(&mut out, b'8');

    write_u8(&mut out, 0); // end INFO
    write_u8(&mut out, 0); // end Action 14
    Ok(out)
}

/// Action 8: GRF id and the default-language name and description.
pub fn grf_id_block(meta: &GrfMetadata) -> Result<Vec<u8>, CompileError> {
    let mut out = Vec::new();
    write_u8(&mut out, ACTION_GRF_ID);
    write_u8(&mut out, GRF_VERSION);
    out.extend_from_slice(&meta.author);
    write_raw_string(&mut out, meta.default_name())?;
    write_raw_string(&mut out, meta.default_description())?;
    Ok(out)
}

/// Assemble the complete file: preamble, body size, compression flag and
/// the framed blocks.
///
/// The first block holds the number of blocks that follow it.
pub fn write_container(meta: &GrfMetadata, payload: &Payload) -> Result<Vec<u8>, CompileError> {
    let mut body = Vec::with_capacity(payload.bytes.len() + 512);

    let mut count = Vec::new();
    write_u32(&mut count, (payload.records + 2) as u32);
    write_block(&mut body, &count);
    write_block(&mut body, &info_block(meta)?);
    write_block(&mut body, &grf_id_block(meta)?);
    body.extend_from_slice(&payload.bytes);

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&MAGIC);
    write_u32(&mut out, body.len() as u32 + 1);
    write_u8(&mut out, NO_COMPRESSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Write `bytes` to `path` through a temporary file in the same directory,
/// renamed into place once complete. On error nothing is left at `path`.
pub fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
