//! Namespace-aware template tree

/// An attribute of a template element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
    pub value: String,
}

impl Attribute {
    /// Unqualified attribute without a namespace
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: None,
            prefix: None,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Attribute bound to a namespace
    pub fn namespaced(
        namespace: impl Into<String>,
        prefix: Option<&str>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: Some(namespace.into()),
            prefix: prefix.map(str::to_string),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Name as written in the source, with its prefix
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }
}

/// An element of a template tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<TemplateNode>,
}

impl Element {
    pub fn new(namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            prefix: None,
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_child(mut self, child: impl Into<TemplateNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_child(TemplateNode::Text(text.into()))
    }

    pub fn is_in(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }

    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    /// Value of an attribute with the given local name and namespace
    pub fn attribute_ns(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    /// Value of an unqualified attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attribute_ns(None, name)
    }

    /// Value of an attribute that may be written qualified with `namespace`
    /// or unqualified. The qualified form wins.
    pub fn attribute_either(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attribute_ns(Some(namespace), name)
            .or_else(|| self.attribute(name))
    }

    /// First child node, if it is text
    pub fn first_text(&self) -> Option<&str> {
        self.children.first().and_then(TemplateNode::as_text)
    }

    /// Child elements in document order, text nodes skipped
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(TemplateNode::as_element)
    }

    /// The element's opening tag as written in the source
    pub fn opening_tag(&self) -> String {
        let mut tag = format!("<{}", self.qualified_name());
        for attr in &self.attributes {
            tag.push_str(&format!(" {}=\"{}\"", attr.qualified_name(), attr.value));
        }
        tag.push('>');
        tag
    }
}

/// A node of a template tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    Element(Element),
    Text(String),
}

impl TemplateNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            TemplateNode::Element(e) => Some(e),
            TemplateNode::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TemplateNode::Text(t) => Some(t),
            TemplateNode::Element(_) => None,
        }
    }
}

impl From<Element> for TemplateNode {
    fn from(element: Element) -> Self {
        TemplateNode::Element(element)
    }
}
