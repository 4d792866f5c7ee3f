use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

use super::layout::{Element, PageLayout, TextRun};
use super::metrics::{encode_win_ansi, text_width, FontFace};
use super::raster::{flate_compress, RasterImage};
use super::RenderError;

const CHECK_MARK: &str = "X";
const CHECK_MARK_SIZE: f32 = 9.0;

/// Metadata written to the document information dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub subject: String,
    pub creator: String,
}

/// Serializes a composed page as a single-page PDF.
///
/// No timestamps or random file identifiers are written, so equal layouts produce equal
/// bytes.
pub(crate) fn write_pdf(layout: &PageLayout, info: &DocumentInfo) -> Result<Vec<u8>, RenderError> {
    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let page_id = alloc.bump();
    let content_id = alloc.bump();
    let info_id = alloc.bump();
    let regular_id = alloc.bump();
    let bold_id = alloc.bump();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);
    pdf.document_info(info_id)
        .title(TextStr(&info.title))
        .subject(TextStr(&info.subject))
        .creator(TextStr(&info.creator));

    for (id, face) in [(regular_id, FontFace::Regular), (bold_id, FontFace::Bold)] {
        pdf.type1_font(id)
            .base_font(Name(face.base_font()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    let mut content = Content::new();
    let mut x_objects: Vec<(String, Ref)> = Vec::new();

    for element in &layout.elements {
        match element {
            Element::Text(run) => draw_text(&mut content, run),
            Element::Rule { x1, x2, y, width } => {
                content.set_line_width(*width);
                content.move_to(*x1, *y);
                content.line_to(*x2, *y);
                content.stroke();
            }
            Element::CheckBox {
                marked, x, y, size, ..
            } => {
                content.set_line_width(1.0);
                content.rect(*x, *y, *size, *size);
                content.stroke();
                if *marked {
                    let mark_width = text_width(CHECK_MARK, FontFace::Bold, CHECK_MARK_SIZE);
                    draw_text(
                        &mut content,
                        &TextRun {
                            x: x + (size - mark_width) / 2.0,
                            y: y + (size - CHECK_MARK_SIZE * 0.72) / 2.0,
                            size: CHECK_MARK_SIZE,
                            face: FontFace::Bold,
                            text: CHECK_MARK.to_string(),
                            underline: false,
                        },
                    );
                }
            }
            Element::Image {
                x,
                y,
                width,
                height,
                image,
                ..
            } => {
                let image_id = alloc.bump();
                write_image(&mut pdf, &mut alloc, image_id, image)?;
                let name = format!("Im{}", x_objects.len() + 1);
                content.save_state();
                content.transform([*width, 0.0, 0.0, *height, *x, *y]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
                x_objects.push((name, image_id));
            }
        }
    }

    pdf.stream(content_id, &content.finish());

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, layout.width, layout.height));
    page.parent(page_tree_id);
    page.contents(content_id);
    let mut resources = page.resources();
    resources
        .fonts()
        .pair(Name(FontFace::Regular.resource_name()), regular_id)
        .pair(Name(FontFace::Bold.resource_name()), bold_id);
    if !x_objects.is_empty() {
        let mut dict = resources.x_objects();
        for (name, id) in &x_objects {
            dict.pair(Name(name.as_bytes()), *id);
        }
        dict.finish();
    }
    resources.finish();
    page.finish();

    Ok(pdf.finish())
}

fn draw_text(content: &mut Content, run: &TextRun) {
    if run.text.is_empty() {
        return;
    }
    content.begin_text();
    content.set_font(Name(run.face.resource_name()), run.size);
    content.next_line(run.x, run.y);
    content.show(Str(&encode_win_ansi(&run.text)));
    content.end_text();

    if run.underline {
        let width = text_width(&run.text, run.face, run.size);
        let offset = run.size * 0.12;
        content.set_line_width(0.5);
        content.move_to(run.x, run.y - offset);
        content.line_to(run.x + width, run.y - offset);
        content.stroke();
    }
}

fn write_image(
    pdf: &mut Pdf,
    alloc: &mut Ref,
    id: Ref,
    raster: &RasterImage,
) -> Result<(), RenderError> {
    let samples = flate_compress(&raster.rgb).map_err(RenderError::Compression)?;
    let mask = match &raster.alpha {
        Some(alpha) => Some((
            alloc.bump(),
            flate_compress(alpha).map_err(RenderError::Compression)?,
        )),
        None => None,
    };

    let mut image = pdf.image_xobject(id, &samples);
    image.filter(Filter::FlateDecode);
    image.width(raster.width as i32);
    image.height(raster.height as i32);
    image.color_space().device_rgb();
    image.bits_per_component(8);
    if let Some((mask_id, _)) = &mask {
        image.s_mask(*mask_id);
    }
    image.finish();

    if let Some((mask_id, data)) = mask {
        let mut alpha = pdf.image_xobject(mask_id, &data);
        alpha.filter(Filter::FlateDecode);
        alpha.width(raster.width as i32);
        alpha.height(raster.height as i32);
        alpha.color_space().device_gray();
        alpha.bits_per_component(8);
        alpha.finish();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::layout::{ChoiceOption, ChoiceSection, ImageRole};
    use crate::document::raster::tests::png_bytes;

    fn info() -> DocumentInfo {
        DocumentInfo {
            title: "Beitrittserklärung".to_string(),
            subject: "Test".to_string(),
            creator: "FFW Apfeltrang e.V.".to_string(),
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn writes_single_a4_page_with_text() {
        let mut layout = PageLayout::a4();
        layout.text(50.0, 700.0, 11.0, FontFace::Regular, "Anna Muster");
        let bytes = write_pdf(&layout, &info()).expect("pdf written");
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"/Count 1"));
        assert!(contains(&bytes, b"/MediaBox [0 0 595 842]"));
        assert!(contains(&bytes, b"(Anna Muster) Tj"));
        assert!(contains(&bytes, b"/WinAnsiEncoding"));
    }

    #[test]
    fn marked_checkbox_draws_cross() {
        let mut layout = PageLayout::a4();
        layout.push(Element::CheckBox {
            section: ChoiceSection::ActiveService,
            option: ChoiceOption::Yes,
            marked: true,
            x: 100.0,
            y: 400.0,
            size: 12.0,
        });
        let bytes = write_pdf(&layout, &info()).expect("pdf written");
        assert!(contains(&bytes, b"(X) Tj"));
    }

    #[test]
    fn translucent_image_gets_soft_mask() {
        let image = RasterImage::decode(&png_bytes(2, 2, [0, 0, 0, 128])).expect("decodes");
        let mut layout = PageLayout::a4();
        layout.push(Element::Image {
            role: ImageRole::MemberSignature,
            x: 50.0,
            y: 100.0,
            width: 150.0,
            height: 40.0,
            image,
        });
        let bytes = write_pdf(&layout, &info()).expect("pdf written");
        assert!(contains(&bytes, b"/Subtype /Image"));
        assert!(contains(&bytes, b"/SMask"));
        assert!(contains(&bytes, b"/Im1 Do"));
    }

    #[test]
    fn identical_layouts_produce_identical_bytes() {
        let mut layout = PageLayout::a4();
        layout.text(50.0, 700.0, 12.0, FontFace::Bold, "Beitrittserklärung");
        let first = write_pdf(&layout, &info()).expect("pdf written");
        let second = write_pdf(&layout, &info()).expect("pdf written");
        assert_eq!(first, second);
    }
}
