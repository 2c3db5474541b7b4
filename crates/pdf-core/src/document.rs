//! PDF Document wrapper

use crate::image::{generate_image_operators, ImageXObject};
use crate::text::{generate_text_operators, TextRenderContext};
use crate::{encode_win_ansi, Align, PdfError, Result, StandardFont};
use crate::{FontStyle, FontWeight};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

/// A4 page width in points
pub const A4_WIDTH: f64 = 595.0;

/// A4 page height in points
pub const A4_HEIGHT: f64 = 842.0;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    /// Gray level (0.0 black, 1.0 white)
    pub fn gray(level: f32) -> Self {
        Self::rgb(level, level, level)
    }

    fn operands(&self) -> String {
        format!("{} {} {}", round(self.r as f64), round(self.g as f64), round(self.b as f64))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// How a closed path is painted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    /// Outline with the stroke color and line width
    Stroke,
    /// Fill with the fill color
    Fill,
}

/// Round a coordinate for the content stream
///
/// Keeps operators short and free of float noise like `0.30000000000000004`.
fn round(value: f64) -> f64 {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Single-page PDF document providing high-level drawing operations
///
/// Coordinates are points with the origin at the bottom-left corner of the
/// page. Operators are buffered in draw order and written to the page when
/// the document is serialized.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// The only page of the document
    page_id: ObjectId,
    /// Content stream object referenced by the page
    contents_id: ObjectId,
    /// Page width in points
    width: f64,
    /// Page height in points
    height: f64,
    /// Current font weight
    current_weight: FontWeight,
    /// Current font style
    current_style: FontStyle,
    /// Current font size
    current_font_size: f32,
    /// Current text color
    current_text_color: Color,
    /// Current stroke color
    stroke_color: Color,
    /// Current fill color
    fill_color: Color,
    /// Current line width
    line_width: f64,
    /// Fonts referenced by the content stream
    used_fonts: BTreeSet<StandardFont>,
    /// Embedded font objects
    embedded_fonts: HashMap<StandardFont, ObjectId>,
    /// Embedded images (data hash -> resource name, PDF object ID)
    embedded_images: HashMap<u64, (String, ObjectId)>,
    /// Next image resource number
    next_image_resource: u32,
    /// Buffered content operators
    content_buffer: Vec<u8>,
}

impl PdfDocument {
    /// Create a blank single-page document
    ///
    /// # Arguments
    /// * `width` - Page width in points
    /// * `height` - Page height in points
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PdfError::InvalidPageSize(width, height));
        }
        Ok(Self::blank(width, height))
    }

    /// Create a blank A4 portrait document
    pub fn a4() -> Self {
        Self::blank(A4_WIDTH, A4_HEIGHT)
    }

    fn blank(width: f64, height: f64) -> Self {
        let mut inner = Document::with_version("1.5");
        let pages_id = inner.new_object_id();
        let contents_id = inner.add_object(Stream::new(Dictionary::new(), Vec::new()));

        let page_id = inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
            "Resources" => Dictionary::new(),
            "Contents" => contents_id,
        });

        inner.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );

        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        Self {
            inner,
            page_id,
            contents_id,
            width,
            height,
            current_weight: FontWeight::Regular,
            current_style: FontStyle::Normal,
            current_font_size: 12.0,
            current_text_color: Color::black(),
            stroke_color: Color::black(),
            fill_color: Color::black(),
            line_width: 1.0,
            used_fonts: BTreeSet::new(),
            embedded_fonts: HashMap::new(),
            embedded_images: HashMap::new(),
            next_image_resource: 1,
            content_buffer: Vec::new(),
        }
    }

    /// Page width in points
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Page height in points
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Set the current font size in points
    pub fn set_font_size(&mut self, size: f32) {
        self.current_font_size = size;
    }

    /// Current font size in points
    pub fn font_size(&self) -> f32 {
        self.current_font_size
    }

    /// Set the current font weight
    pub fn set_font_weight(&mut self, weight: FontWeight) {
        self.current_weight = weight;
    }

    /// Set the current font style
    pub fn set_font_style(&mut self, style: FontStyle) {
        self.current_style = style;
    }

    /// Set weight, style and size in one call
    pub fn set_font(&mut self, weight: FontWeight, style: FontStyle, size: f32) {
        self.current_weight = weight;
        self.current_style = style;
        self.current_font_size = size;
    }

    /// Set text color for subsequent text insertions
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Set the color used by stroked paths
    pub fn set_stroke_color(&mut self, color: Color) {
        self.stroke_color = color;
    }

    /// Set the color used by filled paths
    pub fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    /// Set the line width used by stroked paths
    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    /// Font selected by the current weight and style
    pub fn current_font(&self) -> StandardFont {
        StandardFont::variant(self.current_weight, self.current_style)
    }

    /// Width of `text` in points with the current font and size
    pub fn text_width(&self, text: &str) -> f64 {
        self.current_font()
            .text_width_points(text, self.current_font_size)
    }

    /// Insert text at the given position
    ///
    /// # Arguments
    /// * `text` - Text to draw
    /// * `x` - Anchor X coordinate in points
    /// * `y` - Baseline Y coordinate in points (from bottom)
    /// * `align` - Where the anchor sits relative to the text
    pub fn insert_text(&mut self, text: &str, x: f64, y: f64, align: Align) {
        if text.is_empty() {
            return;
        }

        let font = self.current_font();
        let width = self.text_width(text);
        let start_x = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };

        self.used_fonts.insert(font);
        let ctx = TextRenderContext {
            font_name: font.resource_name().to_string(),
            font_size: self.current_font_size,
            color: self.current_text_color,
        };
        let operators =
            generate_text_operators(&encode_win_ansi(text), round(start_x), round(y), &ctx);
        self.buffer_content(&operators);
    }

    /// Draw a straight line with the current stroke color and line width
    pub fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let operators = format!(
            "q\n{} w\n{} RG\n{} {} m\n{} {} l\nS\nQ\n",
            round(self.line_width),
            self.stroke_color.operands(),
            round(x1),
            round(y1),
            round(x2),
            round(y2),
        );
        self.buffer_content(operators.as_bytes());
    }

    /// Draw a rectangle whose bottom-left corner is `(x, y)`
    pub fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, mode: PaintMode) {
        let rect = format!("{} {} {} {} re", round(x), round(y), round(width), round(height));
        let operators = match mode {
            PaintMode::Stroke => format!(
                "q\n{} w\n{} RG\n{rect}\nS\nQ\n",
                round(self.line_width),
                self.stroke_color.operands(),
            ),
            PaintMode::Fill => format!("q\n{} rg\n{rect}\nf\nQ\n", self.fill_color.operands()),
        };
        self.buffer_content(operators.as_bytes());
    }

    /// Insert an image stretched to the given box
    ///
    /// # Arguments
    /// * `data` - Image file bytes (JPEG or PNG)
    /// * `x` - Left edge in points
    /// * `y` - Bottom edge in points
    /// * `width` - Image width in points
    /// * `height` - Image height in points
    pub fn insert_image(
        &mut self,
        data: &[u8],
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let image_resource_name = self.get_or_create_image_ref(data)?;
        let operators = generate_image_operators(
            &image_resource_name,
            round(x),
            round(y),
            round(width),
            round(height),
        );
        self.buffer_content(&operators);
        Ok(())
    }

    /// Get or create an image resource
    ///
    /// Images are deduplicated by hash of their data.
    fn get_or_create_image_ref(&mut self, data: &[u8]) -> Result<String> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        if let Some((name, _)) = self.embedded_images.get(&data_hash) {
            return Ok(name.clone());
        }

        let xobject = ImageXObject::from_bytes(data)
            .map_err(|e| PdfError::ImageError(format!("Failed to create image XObject: {e}")))?;
        let object_id = self.inner.add_object(xobject.to_pdf_stream());

        let resource_name = format!("Im{}", self.next_image_resource);
        self.next_image_resource += 1;
        self.embedded_images
            .insert(data_hash, (resource_name.clone(), object_id));

        Ok(resource_name)
    }

    /// Buffer content operators for the page
    fn buffer_content(&mut self, content: &[u8]) {
        self.content_buffer.extend_from_slice(content);
    }

    /// Raw content operators drawn so far
    pub fn content(&self) -> &[u8] {
        &self.content_buffer
    }

    /// Write the buffered operators and the page resources
    fn finalize_page(&mut self) -> Result<()> {
        let stream = Stream::new(Dictionary::new(), self.content_buffer.clone());
        self.inner
            .objects
            .insert(self.contents_id, Object::Stream(stream));

        let mut font_dict = Dictionary::new();
        for font in self.used_fonts.clone() {
            let font_id = match self.embedded_fonts.get(&font) {
                Some(id) => *id,
                None => {
                    let id = self.inner.add_object(font.to_pdf_dictionary());
                    self.embedded_fonts.insert(font, id);
                    id
                }
            };
            font_dict.set(font.resource_name(), Object::Reference(font_id));
        }

        let xobjects: BTreeMap<&String, ObjectId> =
            self.embedded_images.values().map(|(name, id)| (name, *id)).collect();
        let mut xobject_dict = Dictionary::new();
        for (name, id) in xobjects {
            xobject_dict.set(name.as_bytes(), Object::Reference(id));
        }

        let mut resources = Dictionary::new();
        if !font_dict.is_empty() {
            resources.set("Font", Object::Dictionary(font_dict));
        }
        if !xobject_dict.is_empty() {
            resources.set("XObject", Object::Dictionary(xobject_dict));
        }

        let page = self
            .inner
            .get_object_mut(self.page_id)?
            .as_dict_mut()
            .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))?;
        page.set("Resources", Object::Dictionary(resources));

        Ok(())
    }

    /// Save the document to bytes
    ///
    /// Can be called repeatedly; each call reflects everything drawn so far.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.finalize_page()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_str(doc: &PdfDocument) -> String {
        String::from_utf8_lossy(doc.content()).into_owned()
    }

    #[test]
    fn test_new_rejects_invalid_size() {
        assert!(matches!(
            PdfDocument::new(0.0, 842.0),
            Err(PdfError::InvalidPageSize(_, _))
        ));
        assert!(PdfDocument::new(f64::NAN, 10.0).is_err());
    }

    #[test]
    fn test_a4_dimensions() {
        let doc = PdfDocument::a4();
        assert_eq!(doc.width(), 595.0);
        assert_eq!(doc.height(), 842.0);
    }

    #[test]
    fn test_to_bytes_is_pdf() {
        let mut doc = PdfDocument::new(241.0, 155.0).unwrap();
        let bytes = doc.to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_insert_text_alignment() {
        let mut doc = PdfDocument::a4();
        doc.set_font_size(10.0);
        // "AB" is 13.34pt wide at 10pt
        doc.insert_text("AB", 100.0, 700.0, Align::Left);
        doc.insert_text("AB", 100.0, 680.0, Align::Center);
        doc.insert_text("AB", 100.0, 660.0, Align::Right);

        let content = content_str(&doc);
        assert!(content.contains("100 700 Td"));
        assert!(content.contains("93.33 680 Td"));
        assert!(content.contains("86.66 660 Td"));
    }

    #[test]
    fn test_insert_text_uses_variant_resource() {
        let mut doc = PdfDocument::a4();
        doc.set_font(FontWeight::Bold, FontStyle::Normal, 16.0);
        doc.insert_text("TITULO", 297.5, 730.0, Align::Center);
        doc.set_font(FontWeight::Regular, FontStyle::Italic, 8.0);
        doc.insert_text("frase", 297.5, 790.0, Align::Center);

        let content = content_str(&doc);
        assert!(content.contains("/F2 16 Tf"));
        assert!(content.contains("/F3 8 Tf"));
    }

    #[test]
    fn test_insert_empty_text_is_noop() {
        let mut doc = PdfDocument::a4();
        doc.insert_text("", 10.0, 10.0, Align::Left);
        assert!(doc.content().is_empty());
    }

    #[test]
    fn test_draw_line() {
        let mut doc = PdfDocument::a4();
        doc.set_line_width(0.5);
        doc.draw_line(100.0, 727.0, 495.0, 727.0);

        let content = content_str(&doc);
        assert!(content.contains("0.5 w"));
        assert!(content.contains("0 0 0 RG"));
        assert!(content.contains("100 727 m\n495 727 l\nS"));
    }

    #[test]
    fn test_draw_rect_modes() {
        let mut doc = PdfDocument::new(241.0, 155.0).unwrap();
        doc.set_fill_color(Color::from_rgb(0, 0, 255));
        doc.draw_rect(2.0, 125.0, 237.0, 28.0, PaintMode::Fill);
        doc.set_line_width(2.0);
        doc.draw_rect(2.0, 2.0, 237.0, 151.0, PaintMode::Stroke);

        let content = content_str(&doc);
        assert!(content.contains("0 0 1 rg\n2 125 237 28 re\nf"));
        assert!(content.contains("2 w\n0 0 0 RG\n2 2 237 151 re\nS"));
    }

    #[test]
    fn test_round_removes_float_noise() {
        assert_eq!(round(0.1 + 0.2), 0.3);
        assert_eq!(round(-0.0001), 0.0);
        assert_eq!(round(297.5), 297.5);
    }

    #[test]
    fn test_resources_written_on_save() {
        let mut doc = PdfDocument::a4();
        doc.set_font_weight(FontWeight::Bold);
        doc.insert_text("X", 10.0, 10.0, Align::Left);
        let bytes = doc.to_bytes().unwrap();

        let loaded = Document::load_mem(&bytes).unwrap();
        let pages = loaded.get_pages();
        assert_eq!(pages.len(), 1);

        let page_id = pages[&1];
        let page = loaded.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.get(b"F2").is_ok());
        assert!(fonts.get(b"F1").is_err());
    }

    #[test]
    fn test_to_bytes_twice_keeps_content() {
        let mut doc = PdfDocument::a4();
        doc.insert_text("Hola", 10.0, 10.0, Align::Left);
        let first = doc.to_bytes().unwrap();
        let second = doc.to_bytes().unwrap();
        assert_eq!(first.len(), second.len());
    }
}
