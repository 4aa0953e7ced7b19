//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate for basic single-band TIFF I/O. Geometry is read
//! from and written to the ModelPixelScale / ModelTiepoint tags; the
//! GDAL_NODATA tag is honoured on read.

use super::{crop_to_extent, ElevationSource, RasterSink, SourceError};
use crate::error::{Error, Result};
use crate::raster::{is_nodata_value, Extent, GeoTransform, Grid, RasterBuffer};
use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tracing::debug;


/// Elevation source backed by a GeoTIFF file on disk
#[derive(Debug, Clone)]
pub struct GeoTiffSource {
    pub path: PathBuf,
    /// Overrides the file's GDAL_NODATA tag when set
    pub nodata: Option<f64>,
}

impl GeoTiffSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            nodata: None,
        }
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }
}

impl ElevationSource for GeoTiffSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self, extent: Option<&Extent>) -> std::result::Result<Grid, SourceError> {
        let grid = read_geotiff(&self.path, self.nodata)?;
        match extent {
            Some(ext) => Ok(crop_to_extent(&grid, ext)?),
            None => Ok(grid),
        }
    }
}

/// Raster sink writing `<dir>/<name>.tif`
#[derive(Debug, Clone)]
pub struct GeoTiffSink {
    dir: PathBuf,
}

impl GeoTiffSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path a raster called `name` is written to
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.tif", name))
    }
}

impl RasterSink for GeoTiffSink {
    fn write_raster(&mut self, name: &str, raster: &RasterBuffer<f64>) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);
        debug!(path = %path.display(), rows = raster.rows, cols = raster.cols, "writing raster");
        write_geotiff(raster, path)
    }
}

/// Read a GeoTIFF file into a Grid.
///
/// `nodata` overrides the file's GDAL_NODATA tag. NaN is always missing.
pub fn read_geotiff<P: AsRef<Path>>(path: P, nodata: Option<f64>) -> Result<Grid> {
    let file = File::open(path.as_ref())?;
    decode_geotiff(file, nodata)
}

/// Read a GeoTIFF from an in-memory buffer into a Grid
pub fn read_geotiff_from_buffer(data: &[u8], nodata: Option<f64>) -> Result<Grid> {
    decode_geotiff(Cursor::new(data), nodata)
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<R>(reader: R, nodata: Option<f64>) -> Result<Grid>
where
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader)
        .map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let nodata = nodata.or_else(|| read_gdal_nodata(&mut decoder));
    let transform = read_geotransform(&mut decoder)?;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<f64> = match result {
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidGrid(format!(
            "TIFF holds {} samples for a {} x {} image; only single-band rasters are supported",
            data.len(),
            rows,
            cols
        )));
    }

    let missing = data.iter().filter(|&&z| is_nodata_value(z, nodata)).count();
    debug!(rows, cols, missing, ?nodata, "decoded GeoTIFF");

    Grid::from_vec(data, rows, cols, nodata, transform)
}

fn read_gdal_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok())
}

/// Read cell geometry from the ModelPixelScale / ModelTiepoint tags.
///
/// Falls back to the unit transform only when both tags are absent.
fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform> {
    let scale = read_f64_tag(decoder, Tag::ModelPixelScaleTag, "ModelPixelScale")?;
    let tiepoint = read_f64_tag(decoder, Tag::ModelTiepointTag, "ModelTiepoint")?;

    let (scale, tiepoint) = match (scale, tiepoint) {
        (None, None) => {
            debug!("no georeferencing tags, using unit cell geometry");
            return Ok(GeoTransform::default());
        }
        (Some(scale), Some(tiepoint)) => (scale, tiepoint),
        (scale, _) => {
            let missing = if scale.is_none() { "ModelPixelScale" } else { "ModelTiepoint" };
            return Err(Error::InvalidGrid(format!(
                "GeoTIFF has only one of ModelPixelScale / ModelTiepoint; {} is missing",
                missing
            )));
        }
    };

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(Error::InvalidGrid(format!(
            "malformed georeferencing: {} scale values, {} tiepoint values",
            scale.len(),
            tiepoint.len()
        )));
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    let transform = GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]);
    transform.validate()?;
    Ok(transform)
}

fn read_f64_tag<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
    name: &str,
) -> Result<Option<Vec<f64>>> {
    let value = decoder
        .find_tag(tag)
        .map_err(|e| Error::InvalidGrid(format!("Cannot read {} tag: {}", name, e)))?;
    value
        .map(|v| v.into_f64_vec())
        .transpose()
        .map_err(|e| Error::InvalidGrid(format!("Invalid {} tag: {}", name, e)))
}

/// Write a raster buffer to a GeoTIFF file as 32-bit float.
///
/// Missing cells are written as NaN.
pub fn write_geotiff<P: AsRef<Path>>(raster: &RasterBuffer<f64>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file)
}

/// Write a raster buffer to an in-memory GeoTIFF
pub fn write_geotiff_to_buffer(raster: &RasterBuffer<f64>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

/// Internal: encode a raster buffer as GeoTIFF into any `Write + Seek` sink
fn encode_geotiff<W>(raster: &RasterBuffer<f64>, writer: W) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    if raster.data.len() != raster.rows * raster.cols || raster.missing.len() != raster.data.len() {
        return Err(Error::InvalidGrid(format!(
            "buffer of {} values / {} mask cells cannot form a {} x {} raster",
            raster.data.len(),
            raster.missing.len(),
            raster.rows,
            raster.cols
        )));
    }

    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let data: Vec<f32> = raster
        .data
        .iter()
        .zip(raster.missing.iter())
        .map(|(&v, &m)| if m { f32::NAN } else { v as f32 })
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(raster.cols as u32, raster.rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let gt = raster.transform;

    let scale = vec![gt.cell_width, gt.cell_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, scale.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

    let tiepoint = vec![0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, tiepoint.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

    // GTModelTypeGeoKey = Projected, GTRasterTypeGeoKey = PixelIsArea
    let geokeys: Vec<u16> = vec![
        1, 1, 0, 2,
        1024, 0, 1, 1,
        1025, 0, 1, 1,
    ];
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, geokeys.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}
