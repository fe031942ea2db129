use crate::context::Context;
use crate::error::Error;
use crate::peach::Peach8;

/// Step by step assembly of a ready to run `Peach8`
///
/// Context and program are required, the font defaults to the built-in one.
pub struct Builder<'a, C: Context> {
    context: Option<C>,
    program: Option<&'a [u8]>,
    font: Option<&'a [u8]>,
}

impl<'a, C: Context> Builder<'a, C> {
    pub fn new() -> Self {
        Self {
            context: None,
            program: None,
            font: None,
        }
    }

    pub fn with_context(mut self, ctx: C) -> Self {
        self.context = Some(ctx);
        self
    }

    pub fn with_program(mut self, prog: &'a [u8]) -> Self {
        self.program = Some(prog);
        self
    }

    pub fn with_font(mut self, font: &'a [u8]) -> Self {
        self.font = Some(font);
        self
    }

    pub fn build(self) -> Result<Peach8<C>, Error> {
        let context = self.context.ok_or(Error::Incomplete("context"))?;
        let program = self.program.ok_or(Error::Incomplete("program"))?;
        let mut peach = Peach8::new(context);
        if let Some(font) = self.font {
            peach.load_font(font)?;
        }
        peach.load_program(program)?;
        Ok(peach)
    }
}

impl<'a, C: Context> Default for Builder<'a, C> {
    fn default() -> Self {
        Self::new()
    }
}
