//! USDA (ASCII) layer parser.
//!
//! Line-oriented parsing of USDA text, covering the subset of the grammar
//! that geometry-bearing layers actually use:
//!
//! - stage metadata: `upAxis`, `metersPerUnit`, `defaultPrim`
//! - `def Xform "Name" { ... }` (Scope is treated as an untransformed Xform)
//! - `def Mesh "Name" { ... }`
//! - prim references: `def Xform "Name" (references = @file@</Prim>)`
//! - mesh attributes: `points`, `faceVertexCounts`, `faceVertexIndices`,
//!   `normals`, `primvars:st`, `primvars:displayColor`, `orientation`
//! - `xformOp:translate`, `xformOp:rotateX/Y/Z`, `xformOp:rotateXYZ`,
//!   `xformOp:scale`

use std::collections::VecDeque;

use plinth_math::{Mat4, Vec3};

use super::types::*;
use crate::error::{LoadError, LoadResult};

/// Parse USDA content into a stage (metadata plus root prims).
pub fn parse_usda(content: &str) -> LoadResult<UsdStage> {
    UsdaParser::new(content).parse()
}

struct UsdaParser {
    lines: VecDeque<(usize, String)>,
    current_line: usize,
}

impl UsdaParser {
    fn new(content: &str) -> Self {
        let lines: VecDeque<_> = content
            .lines()
            .enumerate()
            .map(|(i, s)| (i + 1, s.to_string()))
            .collect();

        Self {
            lines,
            current_line: 0,
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> LoadError {
        LoadError::malformed(format!("USDA line {}: {message}", self.current_line))
    }

    fn parse(mut self) -> LoadResult<UsdStage> {
        let meta = self.parse_stage_meta()?;

        let mut prims = Vec::new();
        while !self.lines.is_empty() {
            if let Some(prim) = self.parse_prim("")? {
                prims.push(prim);
            }
        }

        Ok(UsdStage { meta, prims })
    }

    /// Parse the layer header: `#usda` comment lines followed by an optional
    /// parenthesized stage metadata block.
    fn parse_stage_meta(&mut self) -> LoadResult<StageMeta> {
        let mut meta = StageMeta::default();

        // Leading comments (the `#usda 1.0` cookie among them)
        while let Some((_, line)) = self.lines.front() {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                self.lines.pop_front();
            } else {
                break;
            }
        }

        let starts_meta = self
            .lines
            .front()
            .map(|(_, line)| line.trim_start().starts_with('('))
            .unwrap_or(false);
        if !starts_meta {
            return Ok(meta);
        }

        let mut depth = 0usize;
        loop {
            let (num, line) = match self.lines.pop_front() {
                Some(entry) => entry,
                None => return Err(self.error("unclosed stage metadata block")),
            };
            self.current_line = num;

            depth += line.matches('(').count();
            depth = depth.saturating_sub(line.matches(')').count());

            // Tolerate single-line blocks like `( upAxis = "Y" )`
            let trimmed = line
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')')
                .trim();
            if let Some(value) = attr_value(trimmed, "upAxis") {
                match unquote(value) {
                    "Y" => meta.up_axis = crate::builder::UpAxis::Y,
                    "Z" => meta.up_axis = crate::builder::UpAxis::Z,
                    other => {
                        return Err(self.error(format_args!("unsupported upAxis {other:?}")))
                    }
                }
            } else if let Some(value) = attr_value(trimmed, "metersPerUnit") {
                meta.meters_per_unit = value
                    .parse::<f32>()
                    .map_err(|_| self.error(format_args!("bad metersPerUnit {value:?}")))?;
            } else if let Some(value) = attr_value(trimmed, "defaultPrim") {
                meta.default_prim = Some(unquote(value).to_string());
            }

            if depth == 0 {
                break;
            }
        }

        Ok(meta)
    }

    /// Parse the next prim at the current level, or consume a non-prim line.
    fn parse_prim(&mut self, parent_path: &str) -> LoadResult<Option<UsdPrim>> {
        let (line_num, line) = loop {
            match self.lines.pop_front() {
                Some((num, line)) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with('#') {
                        self.current_line = num;
                        break (num, line);
                    }
                }
                None => return Ok(None),
            }
        };

        let trimmed = line.trim();

        // Closing brace belongs to the caller's block
        if trimmed == "}" {
            self.lines.push_front((line_num, line));
            return Ok(None);
        }

        if trimmed.starts_with("def ") {
            return self.parse_def(trimmed, parent_path, line_num);
        }

        // Stray attribute at this level; ignore it
        Ok(None)
    }

    /// Parse a `def Type "Name"` block.
    fn parse_def(
        &mut self,
        line: &str,
        parent_path: &str,
        start_line: usize,
    ) -> LoadResult<Option<UsdPrim>> {
        let rest = line.strip_prefix("def ").unwrap_or(line);
        let prim_type = rest.split_whitespace().next().unwrap_or("");

        let name = match rest.find('"') {
            Some(open) => {
                let after = &rest[open + 1..];
                match after.find('"') {
                    Some(close) => &after[..close],
                    None => return Err(self.error("unterminated prim name")),
                }
            }
            None => return Err(self.error("prim definition without a name")),
        };

        let path = if parent_path.is_empty() {
            format!("/{name}")
        } else {
            format!("{parent_path}/{name}")
        };

        // Prim metadata can sit inline on the def line or span following lines
        let reference = if let Some(paren_start) = line.find('(') {
            if let Some(paren_end) = line.find(')') {
                let metadata = &line[paren_start..=paren_end];
                if metadata.contains("references") && metadata.contains('@') {
                    Some(self.parse_reference_arc(metadata)?)
                } else {
                    None
                }
            } else {
                self.consume_metadata_block(1)?
            }
        } else {
            self.peek_metadata_block()?
        };

        if !line.contains('{') {
            self.expect_opening_brace()?;
        }

        if let Some((asset_path, target_prim_path)) = reference {
            let reference = self.parse_reference_content(
                &path,
                name,
                asset_path,
                target_prim_path,
                start_line,
            )?;
            return Ok(Some(UsdPrim::Reference(reference)));
        }

        match prim_type {
            // Scope carries no transform, so the shared Xform path works for both
            "Xform" | "Scope" => self
                .parse_xform_content(&path, name, start_line)
                .map(|x| Some(UsdPrim::Xform(x))),
            "Mesh" => self
                .parse_mesh_content(&path, name, start_line)
                .map(|m| Some(UsdPrim::Mesh(m))),
            _ => {
                self.skip_block(start_line)?;
                Ok(Some(UsdPrim::Unknown(prim_type.to_string())))
            }
        }
    }

    /// Consume a metadata block that starts on the following line, if any.
    fn peek_metadata_block(&mut self) -> LoadResult<Option<(String, Option<String>)>> {
        let starts = self
            .lines
            .front()
            .map(|(_, line)| {
                let t = line.trim();
                t.starts_with('(') || t.ends_with('(')
            })
            .unwrap_or(false);
        if !starts {
            return Ok(None);
        }

        self.lines.pop_front();
        self.consume_metadata_block(1)
    }

    /// Consume the remainder of an already-open metadata block, scanning for
    /// a `references = @...@` arc.
    fn consume_metadata_block(
        &mut self,
        mut depth: usize,
    ) -> LoadResult<Option<(String, Option<String>)>> {
        let mut reference = None;

        while depth > 0 {
            let (num, line) = match self.lines.pop_front() {
                Some(entry) => entry,
                None => return Err(self.error("unclosed prim metadata block")),
            };
            self.current_line = num;

            depth += line.matches('(').count();
            depth = depth.saturating_sub(line.matches(')').count());

            if reference.is_none() && line.contains("references") && line.contains('@') {
                reference = Some(self.parse_reference_arc(&line)?);
            }
        }

        Ok(reference)
    }

    /// Parse a reference arc like `references = @./part.usda@</Part>`.
    fn parse_reference_arc(&self, line: &str) -> LoadResult<(String, Option<String>)> {
        let (start, end) = match (line.find('@'), line.rfind('@')) {
            (Some(start), Some(end)) if start < end => (start, end),
            _ => return Err(self.error(format_args!("invalid reference syntax: {line}"))),
        };

        let asset_path = line[start + 1..end].to_string();
        if asset_path.is_empty() {
            return Err(self.error("reference with empty asset path"));
        }

        let after = &line[end + 1..];
        let target_prim = match (after.find('<'), after.find('>')) {
            (Some(open), Some(close)) if open < close => {
                Some(after[open + 1..close].to_string())
            }
            _ => None,
        };

        Ok((asset_path, target_prim))
    }

    fn expect_opening_brace(&mut self) -> LoadResult<()> {
        while let Some((num, line)) = self.lines.front() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.lines.pop_front();
                continue;
            }
            if trimmed == "{" {
                self.current_line = *num;
                self.lines.pop_front();
                return Ok(());
            }
            return Err(self.error("expected opening brace"));
        }
        Err(self.error("expected opening brace, found end of file"))
    }

    fn skip_block(&mut self, start_line: usize) -> LoadResult<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.lines.pop_front() {
                Some((num, line)) => {
                    self.current_line = num;
                    depth += line.matches('{').count();
                    depth = depth.saturating_sub(line.matches('}').count());
                }
                None => {
                    return Err(LoadError::malformed(format!(
                        "USDA line {start_line}: unclosed prim block"
                    )))
                }
            }
        }
        Ok(())
    }

    /// Parse Xform content (transform ops and children).
    fn parse_xform_content(
        &mut self,
        path: &str,
        name: &str,
        start_line: usize,
    ) -> LoadResult<UsdXform> {
        let mut xform = UsdXform {
            path: path.to_string(),
            name: name.to_string(),
            transform: Mat4::IDENTITY,
            children: Vec::new(),
        };

        let mut xform_ops = Vec::new();

        loop {
            let (num, line) = match self.lines.pop_front() {
                Some(entry) => entry,
                None => {
                    return Err(LoadError::malformed(format!(
                        "USDA line {start_line}: unclosed prim block"
                    )))
                }
            };
            self.current_line = num;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed == "}" {
                break;
            }

            // Child prims first; a def line may mention xformOp in overrides
            if trimmed.starts_with("def ") {
                self.lines.push_front((num, line));
                if let Some(child) = self.parse_prim(path)? {
                    xform.children.push(child);
                }
                continue;
            }

            if let Some(op) = self.parse_xform_op(trimmed)? {
                xform_ops.push(op);
            }
        }

        xform.transform = compose_xform_ops(&xform_ops);
        Ok(xform)
    }

    /// Parse content of a prim carrying a reference arc (transform overrides
    /// and child prims only).
    fn parse_reference_content(
        &mut self,
        path: &str,
        name: &str,
        asset_path: String,
        target_prim_path: Option<String>,
        start_line: usize,
    ) -> LoadResult<UsdReference> {
        let inner = self.parse_xform_content(path, name, start_line)?;
        Ok(UsdReference {
            path: inner.path,
            name: inner.name,
            asset_path,
            target_prim_path,
            transform: inner.transform,
            children: inner.children,
        })
    }

    /// Parse Mesh content.
    fn parse_mesh_content(
        &mut self,
        path: &str,
        name: &str,
        start_line: usize,
    ) -> LoadResult<UsdMesh> {
        let mut mesh = UsdMesh {
            path: path.to_string(),
            name: name.to_string(),
            transform: Mat4::IDENTITY,
            ..Default::default()
        };

        let mut xform_ops = Vec::new();

        loop {
            let (num, line) = match self.lines.pop_front() {
                Some(entry) => entry,
                None => {
                    return Err(LoadError::malformed(format!(
                        "USDA line {start_line}: unclosed prim block"
                    )))
                }
            };
            self.current_line = num;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed == "}" {
                break;
            }

            if let Some(op) = self.parse_xform_op(trimmed)? {
                xform_ops.push(op);
                continue;
            }

            if is_attr(trimmed, "points") {
                mesh.points = self.parse_vec3_array(trimmed)?;
            } else if is_attr(trimmed, "faceVertexCounts") {
                mesh.face_vertex_counts = self.parse_int_array(trimmed)?;
            } else if is_attr(trimmed, "faceVertexIndices") {
                mesh.face_vertex_indices = self.parse_int_array(trimmed)?;
            } else if is_attr(trimmed, "normals") {
                mesh.normals = Some(self.parse_vec3_array(trimmed)?);
            } else if is_attr(trimmed, "primvars:st") {
                mesh.st = Some(self.parse_vec2_array(trimmed)?);
            } else if is_attr(trimmed, "primvars:displayColor") {
                mesh.display_color = self.parse_vec3_array(trimmed)?.first().copied();
            } else if trimmed.contains("orientation") && trimmed.contains("\"leftHanded\"") {
                mesh.left_handed = true;
                log::debug!("mesh {} uses left-handed winding", mesh.name);
            } else if trimmed.ends_with('{') || trimmed == "{" {
                // Nested block of an unparsed attribute (e.g. variant sets)
                self.skip_block(num)?;
            }
        }

        mesh.transform = compose_xform_ops(&xform_ops);
        Ok(mesh)
    }

    /// Parse a single xformOp attribute.
    fn parse_xform_op(&self, line: &str) -> LoadResult<Option<XformOp>> {
        // xformOpOrder just names the ops, the values carry the data
        if line.contains("xformOpOrder") || !line.contains("xformOp:") {
            return Ok(None);
        }

        if line.contains("xformOp:translate") && line.contains('=') {
            return Ok(Some(XformOp::Translate(self.parse_inline_vec3(line)?)));
        }
        if line.contains("xformOp:rotateXYZ") && line.contains('=') {
            return Ok(Some(XformOp::RotateXYZ(self.parse_inline_vec3(line)?)));
        }
        if line.contains("xformOp:rotateX") && line.contains('=') {
            return Ok(Some(XformOp::RotateX(self.parse_inline_float(line)?)));
        }
        if line.contains("xformOp:rotateY") && line.contains('=') {
            return Ok(Some(XformOp::RotateY(self.parse_inline_float(line)?)));
        }
        if line.contains("xformOp:rotateZ") && line.contains('=') {
            return Ok(Some(XformOp::RotateZ(self.parse_inline_float(line)?)));
        }
        if line.contains("xformOp:scale") && line.contains('=') {
            return Ok(Some(XformOp::Scale(self.parse_inline_vec3(line)?)));
        }

        Ok(None)
    }

    /// Parse an inline Vec3 value like `(1, 2, 3)` after the `=` sign.
    fn parse_inline_vec3(&self, line: &str) -> LoadResult<Vec3> {
        let eq = line
            .find('=')
            .ok_or_else(|| self.error(format_args!("expected '=' in: {line}")))?;
        let after = &line[eq + 1..];

        let start = after
            .find('(')
            .ok_or_else(|| self.error(format_args!("expected '(' in: {line}")))?;
        let end = after
            .find(')')
            .ok_or_else(|| self.error(format_args!("expected ')' in: {line}")))?;
        if end < start {
            return Err(self.error(format_args!("malformed tuple in: {line}")));
        }

        let parts: Vec<&str> = after[start + 1..end].split(',').collect();
        if parts.len() != 3 {
            return Err(self.error(format_args!(
                "expected 3 components, got {}",
                parts.len()
            )));
        }

        let mut values = [0.0f32; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse::<f32>()
                .map_err(|_| self.error(format_args!("invalid number {:?}", part.trim())))?;
        }

        Ok(Vec3::from_array(values))
    }

    /// Parse an inline scalar value after the `=` sign.
    fn parse_inline_float(&self, line: &str) -> LoadResult<f32> {
        let eq = line
            .find('=')
            .ok_or_else(|| self.error(format_args!("expected '=' in: {line}")))?;
        let value = line[eq + 1..].trim();
        value
            .parse::<f32>()
            .map_err(|_| self.error(format_args!("invalid number {value:?}")))
    }

    /// Collect array text between brackets, reading continuation lines as
    /// needed.
    fn collect_array_text(&mut self, first_line: &str) -> LoadResult<String> {
        let eq = first_line
            .find('=')
            .ok_or_else(|| self.error(format_args!("expected '=' in: {first_line}")))?;
        let after = &first_line[eq + 1..];
        let start = after
            .find('[')
            .ok_or_else(|| self.error(format_args!("expected '[' in: {first_line}")))?;

        let mut content = after[start..].to_string();
        while !content.contains(']') {
            match self.lines.pop_front() {
                Some((num, line)) => {
                    self.current_line = num;
                    content.push(' ');
                    content.push_str(&line);
                }
                None => return Err(self.error("unterminated array")),
            }
        }

        let end = content
            .find(']')
            .ok_or_else(|| self.error("unterminated array"))?;
        Ok(content[1..end].to_string())
    }

    /// Parse a Vec3 array like `[(1, 2, 3), (4, 5, 6)]`.
    fn parse_vec3_array(&mut self, first_line: &str) -> LoadResult<Vec<Vec3>> {
        let inner = self.collect_array_text(first_line)?;
        let mut result = Vec::new();
        for tuple in parse_tuples(&inner) {
            let parts: Vec<&str> = tuple.split(',').collect();
            if parts.len() != 3 {
                return Err(self.error(format_args!("expected 3-component tuple: ({tuple})")));
            }
            let mut values = [0.0f32; 3];
            for (slot, part) in values.iter_mut().zip(&parts) {
                *slot = part
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| self.error(format_args!("invalid number {:?}", part.trim())))?;
            }
            result.push(Vec3::from_array(values));
        }
        Ok(result)
    }

    /// Parse a Vec2 array like `[(0, 0), (1, 0)]` (primvars:st).
    fn parse_vec2_array(&mut self, first_line: &str) -> LoadResult<Vec<[f32; 2]>> {
        let inner = self.collect_array_text(first_line)?;
        let mut result = Vec::new();
        for tuple in parse_tuples(&inner) {
            let parts: Vec<&str> = tuple.split(',').collect();
            if parts.len() != 2 {
                return Err(self.error(format_args!("expected 2-component tuple: ({tuple})")));
            }
            let mut values = [0.0f32; 2];
            for (slot, part) in values.iter_mut().zip(&parts) {
                *slot = part
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| self.error(format_args!("invalid number {:?}", part.trim())))?;
            }
            result.push(values);
        }
        Ok(result)
    }

    /// Parse an int array like `[1, 2, 3]`.
    fn parse_int_array(&mut self, first_line: &str) -> LoadResult<Vec<i32>> {
        let inner = self.collect_array_text(first_line)?;
        let mut result = Vec::new();
        for part in inner.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            result.push(
                part.parse::<i32>()
                    .map_err(|_| self.error(format_args!("invalid index {part:?}")))?,
            );
        }
        Ok(result)
    }
}

/// True when a line declares the named attribute (with any type prefix).
fn is_attr(line: &str, attr: &str) -> bool {
    line.split('=').next().is_some_and(|lhs| {
        lhs.split_whitespace().any(|word| word == attr)
    })
}

/// Extract the value of `name = value` from a metadata line.
fn attr_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (lhs, rhs) = line.split_once('=')?;
    if lhs.trim() == name {
        Some(rhs.trim())
    } else {
        None
    }
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"')
}

/// Split `(a, b), (c, d)` text into the tuple bodies.
fn parse_tuples(inner: &str) -> Vec<&str> {
    let mut tuples = Vec::new();
    let mut rest = inner;
    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        tuples.push(&rest[open + 1..open + close]);
        rest = &rest[open + close + 1..];
    }
    tuples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::UpAxis;

    const CUBE: &str = r#"#usda 1.0
(
    defaultPrim = "Cube"
    upAxis = "Z"
    metersPerUnit = 1.0
)

def Xform "Cube"
{
    double3 xformOp:translate = (0, 0, 1)
    uniform token[] xformOpOrder = ["xformOp:translate"]

    def Mesh "Geom"
    {
        point3f[] points = [(-1, -1, -1), (1, -1, -1), (1, 1, -1), (-1, 1, -1)]
        int[] faceVertexCounts = [4]
        int[] faceVertexIndices = [0, 1, 2, 3]
        normal3f[] normals = [(0, 0, -1), (0, 0, -1), (0, 0, -1), (0, 0, -1)]
        texCoord2f[] primvars:st = [(0, 0), (1, 0), (1, 1), (0, 1)] (
            interpolation = "vertex"
        )
        color3f[] primvars:displayColor = [(0.8, 0.1, 0.1)]
    }
}
"#;

    #[test]
    fn test_parse_stage_metadata() {
        let stage = parse_usda(CUBE).unwrap();

        assert_eq!(stage.meta.up_axis, UpAxis::Z);
        assert_eq!(stage.meta.meters_per_unit, 1.0);
        assert_eq!(stage.meta.default_prim.as_deref(), Some("Cube"));
    }

    #[test]
    fn test_stage_metadata_defaults() {
        let stage = parse_usda("#usda 1.0\n").unwrap();

        // USD defaults: Y-up, centimeters
        assert_eq!(stage.meta.up_axis, UpAxis::Y);
        assert_eq!(stage.meta.meters_per_unit, 0.01);
        assert!(stage.meta.default_prim.is_none());
        assert!(stage.prims.is_empty());
    }

    #[test]
    fn test_parse_mesh_attributes() {
        let stage = parse_usda(CUBE).unwrap();

        let UsdPrim::Xform(xform) = &stage.prims[0] else {
            panic!("expected Xform root");
        };
        assert_eq!(xform.name, "Cube");
        let translation = xform.transform.transform_point3(Vec3::ZERO);
        assert!((translation - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-6);

        let UsdPrim::Mesh(mesh) = &xform.children[0] else {
            panic!("expected Mesh child");
        };
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.face_vertex_counts, vec![4]);
        assert_eq!(mesh.face_vertex_indices, vec![0, 1, 2, 3]);
        assert_eq!(mesh.normals.as_ref().map(Vec::len), Some(4));
        assert_eq!(mesh.st.as_ref().map(Vec::len), Some(4));
        assert_eq!(mesh.display_color, Some(Vec3::new(0.8, 0.1, 0.1)));
        assert!(!mesh.left_handed);
    }

    #[test]
    fn test_parse_multiline_array() {
        let text = r#"#usda 1.0
def Mesh "M"
{
    point3f[] points = [(0, 0, 0), (1, 0, 0),
        (0, 1, 0)]
    int[] faceVertexCounts = [3]
    int[] faceVertexIndices = [0, 1, 2]
}
"#;
        let stage = parse_usda(text).unwrap();
        let UsdPrim::Mesh(mesh) = &stage.prims[0] else {
            panic!("expected Mesh root");
        };
        assert_eq!(mesh.points.len(), 3);
    }

    #[test]
    fn test_parse_reference_prim() {
        let text = r#"#usda 1.0
def Xform "Chair" (
    references = @./chair_geo.usda@</ChairGeo>
)
{
    double3 xformOp:translate = (2, 0, 0)
}
"#;
        let stage = parse_usda(text).unwrap();
        let UsdPrim::Reference(reference) = &stage.prims[0] else {
            panic!("expected Reference root");
        };
        assert_eq!(reference.asset_path, "./chair_geo.usda");
        assert_eq!(reference.target_prim_path.as_deref(), Some("/ChairGeo"));
        let translation = reference.transform.transform_point3(Vec3::ZERO);
        assert!((translation - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_left_handed_orientation() {
        let text = r#"#usda 1.0
def Mesh "M"
{
    uniform token orientation = "leftHanded"
    point3f[] points = [(0, 0, 0), (1, 0, 0), (0, 1, 0)]
    int[] faceVertexCounts = [3]
    int[] faceVertexIndices = [0, 1, 2]
}
"#;
        let stage = parse_usda(text).unwrap();
        let UsdPrim::Mesh(mesh) = &stage.prims[0] else {
            panic!("expected Mesh root");
        };
        assert!(mesh.left_handed);
    }

    #[test]
    fn test_unknown_prim_is_skipped() {
        let text = r#"#usda 1.0
def Camera "Cam"
{
    float focalLength = 50
}

def Mesh "M"
{
    point3f[] points = [(0, 0, 0), (1, 0, 0), (0, 1, 0)]
    int[] faceVertexCounts = [3]
    int[] faceVertexIndices = [0, 1, 2]
}
"#;
        let stage = parse_usda(text).unwrap();
        assert!(matches!(stage.prims[0], UsdPrim::Unknown(_)));
        assert!(matches!(stage.prims[1], UsdPrim::Mesh(_)));
    }

    #[test]
    fn test_unclosed_block_is_malformed() {
        let text = "#usda 1.0\ndef Xform \"X\"\n{\n    double3 xformOp:translate = (0, 0, 0)\n";
        assert!(matches!(parse_usda(text), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_bad_vertex_index_is_malformed() {
        let text = r#"#usda 1.0
def Mesh "M"
{
    int[] faceVertexIndices = [0, x, 2]
}
"#;
        assert!(matches!(parse_usda(text), Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_unsupported_up_axis_is_malformed() {
        let text = "#usda 1.0\n(\n    upAxis = \"X\"\n)\n";
        assert!(matches!(parse_usda(text), Err(LoadError::Malformed(_))));
    }
}
