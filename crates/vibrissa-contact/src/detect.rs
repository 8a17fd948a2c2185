//! Contact generation between whisker links and the object.

use vibrissa_collision::{Aabb, CollisionEnvironment, ObjectPose};
use vibrissa_math::Vec3;
use vibrissa_whisker::{Link, Whisker};

/// A link touching, or about to touch, the object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Link index along the whisker, base first.
    pub link: usize,
    /// Body of that link in the whisker's model.
    pub body: usize,
    /// Contact point on the link surface, world frame.
    pub point: Vec3,
    /// Unit normal from the object towards the link, world frame.
    pub normal: Vec3,
    /// Penetration depth. Negative while the link is inside the contact
    /// margin but still clear of the surface.
    pub depth: f64,
    /// Velocity of the object surface at `point`.
    pub object_velocity: Vec3,
}

/// Contacts between every link of `whisker` and the object at `pose`.
///
/// Uses the cached link frames, so the whisker's kinematics must be
/// current. At most one contact is reported per link.
pub fn find_contacts(
    whisker: &Whisker,
    env: &CollisionEnvironment,
    pose: &ObjectPose,
    margin: f64,
) -> Vec<Contact> {
    if env.is_empty() {
        return Vec::new();
    }
    let links: Vec<Link> = whisker.links().collect();

    // Broad phase: whole-whisker bounds against the object bounds.
    if let Some(object_box) = env.world_aabb(pose) {
        let reach = links.iter().map(|l| l.radius()).fold(0.0, f64::max) + margin;
        let ends: Vec<Vec3> = links
            .iter()
            .flat_map(|l| [l.position, l.distal_end()])
            .collect();
        match Aabb::from_points(&ends) {
            Some(bounds) if bounds.expanded(reach).overlaps(&object_box) => {}
            _ => return Vec::new(),
        }
    }

    links
        .iter()
        .enumerate()
        .filter_map(|(i, link)| {
            let radius = link.radius();
            let prox =
                env.query_segment(pose, &link.position, &link.distal_end(), radius + margin)?;
            Some(Contact {
                link: i,
                body: whisker.link_body(i),
                point: prox.point - prox.normal * radius,
                normal: prox.normal,
                depth: radius - prox.distance,
                object_velocity: pose.linear_velocity,
            })
        })
        .collect()
}
