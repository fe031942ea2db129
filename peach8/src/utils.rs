#[cfg(test)]
pub mod testing {
    use core::fmt;
    use core::ops::RangeBounds;

    use crate::frame::{FrameView, HEIGHT, WIDTH};

    /// Compare two masks only within given ranges of columns and rows
    #[macro_export]
    macro_rules! assert_eq_2d {
        (x_range: $xrange:expr, y_range: $yrange:expr; $lhs:expr, $rhs:expr $(,)?) => {{
            let mut lhs_mask = crate::utils::testing::ImageMask::new();
            let mut rhs_mask = crate::utils::testing::ImageMask::new();
            lhs_mask.set_slice($xrange, $yrange, &$lhs);
            rhs_mask.set_slice($xrange, $yrange, &$rhs);
            assert_eq!(lhs_mask, rhs_mask);
        }};
    }

    #[derive(Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ImageMask([[bool; WIDTH]; HEIGHT]);

    impl ImageMask {
        pub fn new() -> Self {
            Self([[false; WIDTH]; HEIGHT])
        }

        /// Move the content right by `xoffset` and down by `yoffset`, dropping
        /// whatever falls off the edges
        pub fn offset(&mut self, xoffset: usize, yoffset: usize) -> &Self {
            for y in (0..HEIGHT).rev() {
                for x in (0..WIDTH).rev() {
                    let moved = x >= xoffset && y >= yoffset && self.0[y - yoffset][x - xoffset];
                    self.0[y][x] = moved;
                }
            }
            self
        }

        pub fn set_slice<T>(&mut self, range_x: T, range_y: T, other: &Self)
        where
            T: RangeBounds<usize>,
        {
            for x in 0..WIDTH {
                for y in 0..HEIGHT {
                    if range_x.contains(&x) && range_y.contains(&y) {
                        self.0[y][x] = other.0[y][x];
                    }
                }
            }
        }

        pub fn get(&self, x: usize, y: usize) -> bool {
            self.0[y][x]
        }

        pub fn count_lit(&self) -> usize {
            self.0.iter().flatten().filter(|&&p| p).count()
        }
    }

    impl fmt::Debug for ImageMask {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let width = WIDTH + 2;
            writeln!(f)?;
            for _ in 0..width {
                write!(f, "-")?;
            }
            writeln!(f)?;
            for row in &self.0 {
                write!(f, "|")?;
                for &p in row.iter() {
                    write!(f, "{}", if p { "#" } else { " " })?;
                }
                writeln!(f, "|")?;
            }
            for _ in 0..width {
                write!(f, "-")?;
            }
            Ok(())
        }
    }

    pub trait ToMask {
        fn to_mask(&self) -> ImageMask;
    }

    /// Rows separated by whitespace, `#` is a lit pixel, missing rows and
    /// columns stay dark
    impl ToMask for str {
        fn to_mask(&self) -> ImageMask {
            let mut mask = ImageMask::new();
            mask.0
                .iter_mut()
                .zip(self.split_whitespace())
                .for_each(|(m_row, c_row)| {
                    m_row
                        .iter_mut()
                        .zip(c_row.chars())
                        .for_each(|(m, c)| *m = c == '#')
                });
            mask
        }
    }

    impl<'a> ToMask for FrameView<'a> {
        fn to_mask(&self) -> ImageMask {
            let mut mask = ImageMask::new();
            self.iter_rows_as_bitslices()
                .zip(mask.0.iter_mut())
                .for_each(|(f_row, m_row)| {
                    m_row
                        .iter_mut()
                        .zip(f_row.iter().by_vals())
                        .for_each(|(m, f)| *m = f)
                });
            mask
        }
    }

    #[cfg(feature = "embedded-graphics")]
    impl<'a> ToMask for embedded_graphics::image::ImageRaw<'a, embedded_graphics::pixelcolor::BinaryColor> {
        fn to_mask(&self) -> ImageMask {
            use embedded_graphics::{drawable::Pixel, image::IntoPixelIter, pixelcolor::BinaryColor};

            let mut mask = ImageMask::new();
            self.pixel_iter()
                .filter(|Pixel(_, color)| *color == BinaryColor::On)
                .for_each(|Pixel(point, _)| mask.0[point.y as usize][point.x as usize] = true);
            mask
        }
    }

    mod tests {
        use super::*;
        use crate::frame::Frame;

        #[test]
        fn to_image_mask() {
            let empty = Frame::new();
            assert_eq!(ImageMask::new(), empty.view().to_mask());
            assert_eq!("".to_mask(), empty.view().to_mask());

            let mut frame = Frame::new();
            frame.xor_bit(1, 0, true).unwrap();
            frame.xor_bit(0, 1, true).unwrap();
            assert_eq!(".# #.".to_mask(), frame.view().to_mask());
            assert_eq!(frame.view().to_mask().count_lit(), 2);
        }

        #[test]
        fn offset_mask() {
            let mut mask = "#".to_mask();
            mask.offset(3, 2);
            assert!(mask.get(3, 2));
            assert!(!mask.get(0, 0));
            assert_eq!(mask.count_lit(), 1);
        }

        #[test]
        fn compare_slices() {
            let lhs = "##.. ##..".to_mask();
            let rhs = "#### ##..".to_mask();
            assert_eq_2d!(x_range: 0..2, y_range: 0..2; lhs, rhs);
        }
    }
}
