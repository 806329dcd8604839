//! WebDAV bodies for the comments endpoints.

use chrono::DateTime;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::DocumentError;
use crate::types::NkComment;

/// PROPFIND body listing every comment property.
pub const PROPFIND_COMMENTS_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propfind xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns" xmlns:nc="http://nextcloud.org/ns">
  <d:prop>
    <oc:id/>
    <oc:verb/>
    <oc:actorType/>
    <oc:actorId/>
    <oc:creationDateTime/>
    <oc:objectType/>
    <oc:objectId/>
    <oc:isUnread/>
    <oc:message/>
    <oc:actorDisplayName/>
  </d:prop>
</d:propfind>"#;

/// PROPPATCH body resetting the read marker of a comments collection.
pub const MARK_AS_READ_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propertyupdate xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns">
  <d:set>
    <d:prop>
      <oc:readMarker>null</oc:readMarker>
    </d:prop>
  </d:set>
</d:propertyupdate>"#;

/// PROPPATCH body replacing the text of one comment.
pub fn update_comment_body(message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<d:propertyupdate xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns">
  <d:set>
    <d:prop>
      <oc:message>{}</oc:message>
    </d:prop>
  </d:set>
</d:propertyupdate>"#,
        escape(message)
    )
}

#[derive(Default)]
struct CommentFields {
    href: String,
    id: Option<String>,
    verb: String,
    actor_type: String,
    actor_id: String,
    actor_display_name: String,
    creation_date_time: String,
    object_type: String,
    object_id: String,
    is_unread: String,
    message: String,
}

impl CommentFields {
    fn slot(&mut self, tag: &str) -> Option<&mut String> {
        let slot = match tag {
            "href" => &mut self.href,
            "id" => self.id.get_or_insert_with(String::new),
            "verb" => &mut self.verb,
            "actorType" => &mut self.actor_type,
            "actorId" => &mut self.actor_id,
            "actorDisplayName" => &mut self.actor_display_name,
            "creationDateTime" => &mut self.creation_date_time,
            "objectType" => &mut self.object_type,
            "objectId" => &mut self.object_id,
            "isUnread" => &mut self.is_unread,
            "message" => &mut self.message,
            _ => return None,
        };
        Some(slot)
    }

    fn into_comment(self) -> Result<Option<NkComment>, DocumentError> {
        let Some(message_id) = self.id.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        let creation_date_time = DateTime::parse_from_rfc2822(self.creation_date_time.trim())
            .map_err(|_| DocumentError::Date(self.creation_date_time.clone()))?;
        Ok(Some(NkComment {
            path: self.href,
            message_id,
            verb: self.verb,
            actor_type: self.actor_type,
            actor_id: self.actor_id,
            actor_display_name: self.actor_display_name,
            creation_date_time,
            object_type: self.object_type,
            object_id: self.object_id,
            is_unread: matches!(self.is_unread.trim(), "true" | "1"),
            message: self.message,
        }))
    }
}

/// Parse a comments PROPFIND multistatus.
///
/// Responses without an `oc:id` (the collection itself) are skipped.
pub fn parse_comments(xml: &[u8]) -> Result<Vec<NkComment>, DocumentError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut comments = Vec::new();
    let mut current: Option<CommentFields> = None;
    let mut current_tag: Option<String> = None;
    let mut open: Vec<String> = Vec::new();
    let mut saw_multistatus = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let local = local_name(e.name().as_ref());
                open.push(local.clone());
                match local.as_str() {
                    "multistatus" => saw_multistatus = true,
                    "response" => current = Some(CommentFields::default()),
                    _ => current_tag = Some(local),
                }
            }
            Event::Text(e) => {
                if let (Some(fields), Some(tag)) = (current.as_mut(), current_tag.as_deref()) {
                    if let Some(slot) = fields.slot(tag) {
                        slot.push_str(&e.unescape().map_err(quick_xml::Error::from)?);
                    }
                }
            }
            Event::CData(e) => {
                if let (Some(fields), Some(tag)) = (current.as_mut(), current_tag.as_deref()) {
                    if let Some(slot) = fields.slot(tag) {
                        slot.push_str(std::str::from_utf8(&e.into_inner())?);
                    }
                }
            }
            Event::End(e) => {
                open.pop();
                let local = local_name(e.name().as_ref());
                if local == "response" {
                    if let Some(fields) = current.take() {
                        comments.extend(fields.into_comment()?);
                    }
                } else if current_tag.as_deref() == Some(local.as_str()) {
                    current_tag = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(DocumentError::UnclosedElement(open.remove(0)));
    }
    if !saw_multistatus {
        return Err(DocumentError::NoRootElement);
    }
    Ok(comments)
}

fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rfind(':') {
        Some(pos) => name[pos + 1..].to_string(),
        None => name.into_owned(),
    }
}
