use chrono::Local;
use lopdf::content::{ Content, Operation };
use lopdf::{ dictionary, Document, Object, Stream };

use super::raster::RasterImage;
use super::ExportError;

const POINTS_PER_MM: f32 = 72.0 / 25.4;
const IMAGE_NAME: &str = "Im1";
const DOCUMENT_TITLE: &str = "Conversacion KIN-Bot";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize { width_mm: 210.0, height_mm: 297.0 };

    pub fn with_width_mm(width_mm: f32) -> Self {
        Self { width_mm, ..Self::A4 }
    }

    pub fn width_pt(&self) -> f32 {
        self.width_mm * POINTS_PER_MM
    }

    pub fn height_pt(&self) -> f32 {
        self.height_mm * POINTS_PER_MM
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Where the captured pane lands on the page, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub page_width: f32,
    pub page_height: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The image spans the full page width, keeps its aspect ratio and is
/// anchored at the top. The page grows taller when the image needs it.
pub fn placement(page: PageSize, image_width: u32, image_height: u32) -> ImagePlacement {
    let width = page.width_pt();
    let height = image_height as f32 * width / image_width as f32;
    let page_height = page.height_pt().max(height);
    ImagePlacement {
        page_width: width,
        page_height,
        x: 0.0,
        y: page_height - height,
        width,
        height,
    }
}

pub fn write_pdf(image: &RasterImage, page: PageSize) -> Result<Vec<u8>, ExportError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ExportError::EmptyImage);
    }
    let place = placement(page, image.width(), image.height());

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width() as i64,
            "Height" => image.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.pixels().to_vec(),
    );
    let image_id = doc.add_object(image_stream);

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            IMAGE_NAME => image_id,
        },
    });

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![
                place.width.into(),
                Object::Integer(0),
                Object::Integer(0),
                place.height.into(),
                place.x.into(),
                place.y.into(),
            ]),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content.encode().map_err(|e| ExportError::Pdf(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), place.page_width.into(), place.page_height.into()],
    });

    doc.objects.insert(pages_id, Object::Dictionary(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    }));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(DOCUMENT_TITLE),
        "Producer" => Object::string_literal(concat!("kinbot ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(Local::now().format("D:%Y%m%d%H%M%S").to_string()),
    });
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(bytes)
}
