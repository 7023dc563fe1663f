//! Font definitions for label rendering.
//!
//! Wire shape, every field optional:
//!
//! ```text
//! { fontName, fontSize, textAlign, verticalAlign, fillStyle,
//!   boundingWidth, boundingHeight,
//!   shadowEnabled, shadowOffsetX, shadowOffsetY, shadowBlur, shadowOpacity,
//!   strokeEnabled, strokeStyle, lineWidth }
//! ```
//!
//! Shadow and stroke fields are only read when their `*Enabled` flag is
//! truthy, and only written when the effect is present.

use scenebridge_core::{ObjectHandle, ScriptRuntime, ScriptValue};

use super::compound::{Color3B, Size, Vec2};
use super::{FromScript, ToScript, object_handle};
use crate::error::{BridgeResult, ConversionError};

pub const DEFAULT_FONT_NAME: &str = "Arial";
pub const DEFAULT_FONT_SIZE: i32 = 32;

/// Drop shadow behind label text.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontShadow {
    pub offset: Vec2,
    pub blur: f32,
    pub opacity: f32,
}

/// Outline around label text.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontStroke {
    pub color: Color3B,
    pub size: f32,
}

/// How a label renders its text.
#[derive(Clone, Debug, PartialEq)]
pub struct FontDefinition {
    pub font_name: String,
    pub font_size: i32,
    /// Horizontal alignment id
    pub text_align: u32,
    /// Vertical alignment id
    pub vertical_align: u32,
    pub fill_color: Color3B,
    /// Zero means unbounded.
    pub dimensions: Size,
    pub shadow: Option<FontShadow>,
    pub stroke: Option<FontStroke>,
}

impl Default for FontDefinition {
    fn default() -> Self {
        Self {
            font_name: DEFAULT_FONT_NAME.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            text_align: 0,
            vertical_align: 0,
            fill_color: Color3B::WHITE,
            dimensions: Size::default(),
            shadow: None,
            stroke: None,
        }
    }
}

fn number(value: impl Into<f64>) -> ScriptValue {
    ScriptValue::Number(value.into())
}

/// Read `field`, or `default` when it is `undefined`.
fn optional<T, R>(rt: &R, object: ObjectHandle, field: &str, default: T) -> Result<T, ConversionError>
where
    T: FromScript,
    R: ScriptRuntime + ?Sized,
{
    let value = rt.get_named(object, field)?;
    if value.is_undefined() {
        return Ok(default);
    }
    T::from_script(rt, &value)
}

impl FromScript for FontDefinition {
    fn from_script<R>(rt: &R, value: &ScriptValue) -> Result<Self, ConversionError>
    where
        R: ScriptRuntime + ?Sized,
    {
        let object = object_handle(value, "FontDefinition")?;
        let defaults = FontDefinition::default();

        let shadow = if optional(rt, object, "shadowEnabled", false)? {
            Some(FontShadow {
                offset: Vec2::new(
                    optional(rt, object, "shadowOffsetX", 0.0)?,
                    optional(rt, object, "shadowOffsetY", 0.0)?,
                ),
                blur: optional(rt, object, "shadowBlur", 0.0)?,
                opacity: optional(rt, object, "shadowOpacity", 0.0)?,
            })
        } else {
            None
        };

        let stroke = if optional(rt, object, "strokeEnabled", false)? {
            Some(FontStroke {
                color: optional(rt, object, "strokeStyle", Color3B::default())?,
                size: optional(rt, object, "lineWidth", 0.0)?,
            })
        } else {
            None
        };

        Ok(Self {
            font_name: optional(rt, object, "fontName", defaults.font_name)?,
            font_size: optional(rt, object, "fontSize", defaults.font_size)?,
            text_align: optional(rt, object, "textAlign", defaults.text_align)?,
            vertical_align: optional(rt, object, "verticalAlign", defaults.vertical_align)?,
            fill_color: optional(rt, object, "fillStyle", defaults.fill_color)?,
            dimensions: Size::new(
                optional(rt, object, "boundingWidth", 0.0)?,
                optional(rt, object, "boundingHeight", 0.0)?,
            ),
            shadow,
            stroke,
        })
    }
}

impl ToScript for FontDefinition {
    fn to_script<R>(&self, rt: &mut R) -> BridgeResult<ScriptValue>
    where
        R: ScriptRuntime + ?Sized,
    {
        let object = rt.new_object()?;
        rt.set_named(object, "fontName", ScriptValue::string(&self.font_name))?;
        rt.set_named(object, "fontSize", number(self.font_size))?;
        rt.set_named(object, "textAlign", number(self.text_align))?;
        rt.set_named(object, "verticalAlign", number(self.vertical_align))?;
        let fill = self.fill_color.to_script(rt)?;
        rt.set_named(object, "fillStyle", fill)?;
        rt.set_named(object, "boundingWidth", number(self.dimensions.width))?;
        rt.set_named(object, "boundingHeight", number(self.dimensions.height))?;

        rt.set_named(object, "shadowEnabled", ScriptValue::Bool(self.shadow.is_some()))?;
        if let Some(shadow) = &self.shadow {
            rt.set_named(object, "shadowOffsetX", number(shadow.offset.x))?;
            rt.set_named(object, "shadowOffsetY", number(shadow.offset.y))?;
            rt.set_named(object, "shadowBlur", number(shadow.blur))?;
            rt.set_named(object, "shadowOpacity", number(shadow.opacity))?;
        }

        rt.set_named(object, "strokeEnabled", ScriptValue::Bool(self.stroke.is_some()))?;
        if let Some(stroke) = &self.stroke {
            let color = stroke.color.to_script(rt)?;
            rt.set_named(object, "strokeStyle", color)?;
            rt.set_named(object, "lineWidth", number(stroke.size))?;
        }
        Ok(ScriptValue::Object(object))
    }
}
