//! Card icons: EFimg descriptors, image instances and XPM rendering
//!
//! An EFimg record points at an image instance inside an image instance data
//! file (IIDF). Basic images are one bit per pixel. Colour images carry a
//! small header naming the palette (CLUT) size and its offset within the same
//! file; the palette is a run of RGB triplets.

use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::files::FileId;

/// Length of one EFimg descriptor
pub const DESCRIPTOR_LENGTH: usize = 9;

/// Symbols used for palette entries, two per pixel above 64 colours
const XPM_SYMBOLS: &[u8; 64] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+/";

/// Image coding scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageScheme {
    /// Monochrome, one bit per pixel
    Basic,
    /// Palette based colour
    Colour,
    /// Palette based colour whose last entry is transparent
    ColourTransparency,
}

impl TryFrom<u8> for ImageScheme {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x11 => Ok(Self::Basic),
            0x21 => Ok(Self::Colour),
            0x22 => Ok(Self::ColourTransparency),
            _ => Err(Error::Unsupported("image coding scheme")),
        }
    }
}

/// One EFimg descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Width in pixels
    pub width: u8,
    /// Height in pixels
    pub height: u8,
    /// Coding scheme
    pub scheme: ImageScheme,
    /// Image instance data file
    pub file_id: FileId,
    /// Offset of the image instance within the file
    pub offset: u16,
    /// Length of the image instance
    pub length: u16,
}

impl ImageDescriptor {
    /// Parse a 9-byte descriptor
    pub fn parse(data: &[u8]) -> Result<Self> {
        Error::ensure_len(data.len(), DESCRIPTOR_LENGTH)?;
        Ok(Self {
            width: data[0],
            height: data[1],
            scheme: ImageScheme::try_from(data[2])?,
            file_id: FileId(u16::from_be_bytes([data[3], data[4]])),
            offset: u16::from_be_bytes([data[5], data[6]]),
            length: u16::from_be_bytes([data[7], data[8]]),
        })
    }

    /// Parse the first descriptor of an EFimg record
    ///
    /// Records are a descriptor count followed by 9-byte descriptors and an
    /// optional trailing byte.
    pub fn parse_record(record: &[u8]) -> Result<Self> {
        let len = record.len();
        if len < DESCRIPTOR_LENGTH + 1 || !matches!(len % DESCRIPTOR_LENGTH, 1 | 2) {
            return Err(Error::InvalidData("EFimg record length"));
        }
        Self::parse(&record[1..])
    }
}

/// Header of a colour image instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColourHeader {
    /// Width in pixels
    pub width: u8,
    /// Height in pixels
    pub height: u8,
    /// Bits per raster point
    pub bits_per_point: u8,
    /// Number of palette entries
    pub colours: usize,
    /// Offset of the palette within the image instance data file
    pub clut_offset: u16,
}

impl ColourHeader {
    /// Length of the header preceding the raster
    pub const LENGTH: usize = 6;

    /// Parse the header of a colour image instance
    pub fn parse(data: &[u8]) -> Result<Self> {
        Error::ensure_len(data.len(), Self::LENGTH)?;
        Ok(Self {
            width: data[0],
            height: data[1],
            bits_per_point: data[2],
            colours: match data[3] {
                0 => 256,
                n => usize::from(n),
            },
            clut_offset: u16::from_be_bytes([data[4], data[5]]),
        })
    }

    /// Number of palette bytes to read
    pub const fn clut_length(&self) -> usize {
        self.colours * 3
    }
}

struct Raster<'a> {
    data: &'a [u8],
    bit: usize,
}

impl Raster<'_> {
    fn next(&mut self, bits: u8) -> usize {
        let mut value = 0;
        for _ in 0..bits {
            let byte = self.data[self.bit / 8];
            let b = (byte >> (7 - self.bit % 8)) & 1;
            value = (value << 1) | usize::from(b);
            self.bit += 1;
        }
        value
    }
}

fn symbol(index: usize, cpp: usize) -> String {
    if cpp == 2 {
        [XPM_SYMBOLS[index / 64 % 64], XPM_SYMBOLS[index % 64]]
            .iter()
            .map(|&c| char::from(c))
            .collect()
    } else {
        char::from(XPM_SYMBOLS[index % 64]).to_string()
    }
}

/// Render an image instance as XPM text
///
/// `clut` is ignored for the basic scheme.
pub fn render_xpm(scheme: ImageScheme, image: &[u8], clut: &[u8]) -> Result<String> {
    let (width, height, bits, colours, raster) = match scheme {
        ImageScheme::Basic => {
            Error::ensure_len(image.len(), 2)?;
            (image[0], image[1], 1, 2, &image[2..])
        }
        ImageScheme::Colour | ImageScheme::ColourTransparency => {
            let header = ColourHeader::parse(image)?;
            if !(1..=8).contains(&header.bits_per_point) {
                return Err(Error::InvalidData("bits per raster point"));
            }
            Error::ensure_len(clut.len(), header.clut_length())?;
            (
                header.width,
                header.height,
                header.bits_per_point,
                header.colours,
                &image[ColourHeader::LENGTH..],
            )
        }
    };

    let pixels = usize::from(width) * usize::from(height);
    Error::ensure_len(raster.len(), (pixels * usize::from(bits)).div_ceil(8))?;

    let cpp = if colours > 64 { 2 } else { 1 };

    let mut xpm = String::from("/* XPM */\nstatic char *xpm[] = {\n");
    let _ = writeln!(xpm, "\"{width} {height} {colours} {cpp}\",");

    match scheme {
        ImageScheme::Basic => {
            xpm.push_str("\"0\tc #FFFFFF\",\n");
            xpm.push_str("\"1\tc #000000\",\n");
        }
        _ => {
            for (i, rgb) in clut.chunks_exact(3).take(colours).enumerate() {
                let sym = symbol(i, cpp);
                if scheme == ImageScheme::ColourTransparency && i == colours - 1 {
                    let _ = writeln!(xpm, "\"{sym}\tc None\",");
                } else {
                    let _ = writeln!(
                        xpm,
                        "\"{sym}\tc #{:02X}{:02X}{:02X}\",",
                        rgb[0], rgb[1], rgb[2]
                    );
                }
            }
        }
    }

    let mut raster = Raster { data: raster, bit: 0 };
    for row in 0..height {
        xpm.push('"');
        for _ in 0..width {
            let entry = raster.next(bits);
            if entry >= colours {
                return Err(Error::InvalidData("pixel outside palette"));
            }
            xpm.push_str(&symbol(entry, cpp));
        }
        xpm.push_str(if row + 1 < height { "\",\n" } else { "\"\n" });
    }
    xpm.push_str("};\n");

    Ok(xpm)
}
